//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责分批调度和端到端流程，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量分类处理器
//! - 把大量书签切分为固定大小的批次
//! - 串行调用分类服务，批次之间插入固定延迟（远端服务有频率限制）
//! - 把各批次的部分结果合并为统一的分类结果
//!
//! ### `pipeline` - 端到端流程
//! - 搜索书签 → 查缓存 → 分类 → 存缓存 → 导出
//! - 持有全部注入的能力（聊天客户端、存储、书签源、下载）
//!
//! ## 层次关系
//!
//! ```text
//! pipeline (端到端流程 App)
//!     ↓
//! batch_processor (处理 Vec<Bookmark>)
//!     ↓
//! services (能力层：classifier / cache / bookmark / export)
//!     ↓
//! api + infrastructure (聊天 API 和注入的能力)
//! ```
//!
//! ## 设计原则
//!
//! 1. **严格串行**：同一请求的分类调用绝不并发，否则批次间延迟失去意义
//! 2. **向下依赖**：编排层 → services → api/infrastructure
//! 3. **无业务逻辑**：只做调度、合并和统计

pub mod batch_processor;
pub mod pipeline;

// 重新导出主要类型
pub use batch_processor::{merge_classification_results, BatchClassifier};
pub use pipeline::App;
