//! Assignment Tracker - 课程作业追踪与自动提交服务
//!
//! 把 Google Classroom 的作业、本人提交记录和 GitHub 仓库中的提交文件合并成
//! 统一的作业视图，并在截止前自动提交已准备好的作业。
//!
//! # 架构
//! - `adapters`: 外部系统适配器（Classroom、Drive、GitHub、SMTP）
//! - `config`: 配置管理
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理（启动、定时对账、停机）
//! - `services`: 业务逻辑层（状态解析、自动提交判定、提交执行、对账流程）
//! - `utils`: 工具函数

pub mod adapters;
pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
