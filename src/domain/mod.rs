// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：视频结果、响应与查询
/// - 搜索（search）：适配器契约与 bang 解析
/// - 服务（services）：面向边界层的搜索服务
pub mod models;
pub mod search;
pub mod services;
