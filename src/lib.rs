//! # Bookmark Classifier
//!
//! 一个用 AI 对书签进行主题分类的 Rust 库
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部能力，只暴露接口
//! - `KeyValueStore` - 键值存储能力（对应 localStorage）
//! - `BookmarkSource` - 书签数据源能力（对应浏览器书签 API）
//! - `DownloadSink` - 下载能力（对应浏览器下载 API）
//!
//! ### ② API 层
//! - `api/chat` - 聊天补全能力（ChatApi trait + async-openai 客户端）
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程顺序
//! - `ClassifierService` - 单批书签的 LLM 分类能力（含防御性解析和兜底）
//! - `CacheService` - 分类结果缓存能力（索引 + 条目，两条淘汰策略）
//! - `BookmarkService` - 书签树规范化和搜索能力
//! - `export_service` - JSON / 文本 / CSV / HTML 四种导出格式
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 分批串行调度和结果合并
//! - `orchestrator/pipeline` - 端到端流程（搜索 → 缓存 → 分类 → 导出）
//!
//! ## 模块结构

pub mod api;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use api::{ChatApi, ChatClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Bookmark, CacheEntry, Category, ClassificationResult};
pub use orchestrator::{merge_classification_results, App, BatchClassifier};
pub use services::{BookmarkService, CacheService, ClassifierService};
