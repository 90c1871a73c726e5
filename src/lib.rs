// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 请求参数 DTO
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 视频结果模型、查询、适配器契约、bang 解析与搜索服务
pub mod domain;

/// 引擎模块
///
/// 适配器熔断保护
pub mod engines;

/// 基础设施模块
///
/// 搜索缓存、引擎管理器、抓取适配器与指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
