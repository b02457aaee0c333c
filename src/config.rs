use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, AppResult, ConfigError, FileError};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- DeepSeek API 配置 ---
    pub api_base_url: String,
    pub api_key: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 批处理大小
    pub batch_size: usize,
    /// 批处理间隔(ms)
    pub batch_delay_ms: u64,
    // --- 书签分类配置 ---
    pub default_categories: Vec<String>,
    // --- 输出配置 ---
    pub output_dir: String,
    pub cache_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.deepseek.com/v1".to_string(),
            api_key: String::new(),
            model_name: "deepseek-chat".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            batch_size: 50,
            batch_delay_ms: 1000,
            default_categories: vec![
                "开发工具".to_string(),
                "学习资源".to_string(),
                "新闻资讯".to_string(),
                "娱乐休闲".to_string(),
                "购物商城".to_string(),
                "社交媒体".to_string(),
                "工作效率".to_string(),
                "设计素材".to_string(),
                "技术文档".to_string(),
                "其他".to_string(),
            ],
            output_dir: "exports".to_string(),
            cache_file: "bookmark_cache.json".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("DEEPSEEK_API_BASE_URL").unwrap_or(default.api_base_url),
            api_key: std::env::var("DEEPSEEK_API_KEY").unwrap_or(default.api_key),
            model_name: std::env::var("DEEPSEEK_MODEL").unwrap_or(default.model_name),
            temperature: std::env::var("DEEPSEEK_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.temperature),
            max_tokens: std::env::var("DEEPSEEK_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_tokens),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_size),
            batch_delay_ms: std::env::var("BATCH_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_delay_ms),
            default_categories: default.default_categories,
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            cache_file: std::env::var("CACHE_FILE").unwrap_or(default.cache_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 配置文件加载
    ///
    /// 文件中缺失的字段使用默认值补齐
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::File(FileError::ReadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        Ok(config)
    }

    /// 检查配置是否完整
    pub fn validate(&self) -> AppResult<()> {
        if self.api_key.is_empty() {
            return Err(AppError::Config(ConfigError::ApiKeyMissing));
        }
        if self.api_base_url.is_empty() {
            return Err(AppError::Config(ConfigError::EndpointMissing));
        }
        Ok(())
    }
}
