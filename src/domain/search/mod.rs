// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 搜索领域模块
///
/// 定义适配器接口和 bang 语法
pub mod adapter;
pub mod bang;
