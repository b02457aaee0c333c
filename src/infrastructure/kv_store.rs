//! 键值存储能力
//!
//! 缓存服务依赖的同步字符串键值存储，对应浏览器环境中的 localStorage。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{AppError, AppResult, CacheError};

/// 同步键值存储能力
///
/// 写入失败（如配额不足）必须以领域错误返回，而不是 panic
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&mut self, key: &str);
}

/// 内存键值存储
///
/// 可选容量上限用于模拟浏览器存储配额
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: HashMap<String, String>,
    capacity_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带容量上限（字节）的内存存储
    pub fn with_capacity_bytes(capacity: usize) -> Self {
        Self {
            data: HashMap::new(),
            capacity_bytes: Some(capacity),
        }
    }

    fn total_bytes_after(&self, key: &str, value: &str) -> usize {
        let mut total = value.len() + key.len();
        for (k, v) in &self.data {
            if k != key {
                total += k.len() + v.len();
            }
        }
        total
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        if let Some(capacity) = self.capacity_bytes {
            let needed = self.total_bytes_after(key, value);
            if needed > capacity {
                return Err(AppError::Cache(CacheError::QuotaExceeded {
                    needed,
                    capacity,
                }));
            }
        }
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.data.remove(key);
    }
}

/// JSON 文件键值存储
///
/// 整个映射持久化在单个 JSON 文件中，每次写入后落盘
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: HashMap<String, String>,
}

impl JsonFileStore {
    /// 打开存储文件，不存在则从空映射开始
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    // 文件损坏时从空映射重新开始，不中断程序
                    warn!("存储文件损坏，将重新创建 ({}): {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Ok(Self { path, data })
    }

    fn persist(&self) -> AppResult<()> {
        let content = serde_json::to_string(&self.data)?;
        std::fs::write(&self.path, content)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        self.data.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) {
        self.data.remove(key);
        if let Err(e) = self.persist() {
            warn!("删除键后持久化失败 ({}): {}", key, e);
        }
    }
}
