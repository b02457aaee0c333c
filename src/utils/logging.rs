//! 日志工具模块
//!
//! 提供 tracing 订阅器初始化和日志格式化辅助函数

use tracing_subscriber::EnvFilter;

/// 初始化日志订阅器
///
/// 过滤级别由 RUST_LOG 控制，默认 info。
/// 重复调用是安全的（后续调用被忽略）。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
