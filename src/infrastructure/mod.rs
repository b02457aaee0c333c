//! 基础设施层（Infrastructure）
//!
//! 持有外部能力（存储、书签数据源、下载），只暴露能力接口。
//! 业务层通过这里的 trait 注入依赖，测试时可以用内存实现替换。

pub mod bookmark_source;
pub mod download;
pub mod kv_store;

pub use bookmark_source::{BookmarkSource, MemoryBookmarkSource};
pub use download::{DownloadSink, FileDownloadSink};
pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore};
