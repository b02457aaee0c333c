//! 业务能力层（Services）
//!
//! 描述"我能做什么"：分类、缓存、书签整理、导出。
//! 每个服务只处理单一能力，不关心流程顺序。

pub mod bookmark_service;
pub mod cache_service;
pub mod classifier;
pub mod export_service;

pub use bookmark_service::BookmarkService;
pub use cache_service::CacheService;
pub use classifier::ClassifierService;
