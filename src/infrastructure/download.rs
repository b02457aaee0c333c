//! 下载能力
//!
//! 对应浏览器的下载 API：接收 (内容, 文件名, MIME 类型) 并触发保存。
//! 成功与否用布尔值表示，不抛错。

use std::path::{Path, PathBuf};

use tracing::{error, info};

/// 下载触发能力
pub trait DownloadSink {
    /// 保存内容到用户可见的位置，返回是否成功
    fn download(&self, content: &str, filename: &str, mime_type: &str) -> bool;
}

impl<T: DownloadSink> DownloadSink for std::sync::Arc<T> {
    fn download(&self, content: &str, filename: &str, mime_type: &str) -> bool {
        (**self).download(content, filename, mime_type)
    }
}

/// 文件系统下载实现，把内容写入指定目录
#[derive(Debug, Clone)]
pub struct FileDownloadSink {
    dir: PathBuf,
}

impl FileDownloadSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl DownloadSink for FileDownloadSink {
    fn download(&self, content: &str, filename: &str, mime_type: &str) -> bool {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            error!("创建输出目录失败 ({}): {}", self.dir.display(), e);
            return false;
        }
        let path = self.dir.join(filename);
        match std::fs::write(&path, content) {
            Ok(()) => {
                info!("✓ 已保存 {} ({})", path.display(), mime_type);
                true
            }
            Err(e) => {
                error!("下载失败 ({}): {}", path.display(), e);
                false
            }
        }
    }
}
