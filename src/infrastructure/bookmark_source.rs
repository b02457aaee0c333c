//! 书签数据源能力
//!
//! 对应浏览器的原生书签 API（getTree / search / remove）。
//! 生产环境由扩展宿主提供；这里附带一个内存实现，
//! 在开发模式下充当桩数据源，也用于测试。

use crate::error::{AppError, AppResult, SourceError};
use crate::models::BookmarkNode;

/// 书签数据源能力
pub trait BookmarkSource {
    /// 获取完整的书签树
    fn get_tree(&self) -> AppResult<Vec<BookmarkNode>>;
    /// 搜索书签，返回扁平的匹配节点列表
    fn search(&self, query: &str) -> AppResult<Vec<BookmarkNode>>;
    /// 删除指定书签
    fn remove(&mut self, id: &str) -> AppResult<()>;
}

/// 内存书签数据源（开发桩）
#[derive(Debug, Clone)]
pub struct MemoryBookmarkSource {
    tree: Vec<BookmarkNode>,
}

impl MemoryBookmarkSource {
    pub fn new(tree: Vec<BookmarkNode>) -> Self {
        Self { tree }
    }

    fn collect_matches(nodes: &[BookmarkNode], query: &str, out: &mut Vec<BookmarkNode>) {
        for node in nodes {
            if node.url.is_some() {
                let title_hit = node.title.to_lowercase().contains(query);
                let url_hit = node
                    .url
                    .as_deref()
                    .map(|u| u.to_lowercase().contains(query))
                    .unwrap_or(false);
                if title_hit || url_hit {
                    let mut flat = node.clone();
                    flat.children = Vec::new();
                    out.push(flat);
                }
            }
            Self::collect_matches(&node.children, query, out);
        }
    }

    fn remove_by_id(nodes: &mut Vec<BookmarkNode>, id: &str) -> bool {
        if let Some(pos) = nodes.iter().position(|n| n.id == id) {
            nodes.remove(pos);
            return true;
        }
        for node in nodes.iter_mut() {
            if Self::remove_by_id(&mut node.children, id) {
                return true;
            }
        }
        false
    }
}

impl Default for MemoryBookmarkSource {
    /// 开发模式下注入的桩数据
    fn default() -> Self {
        Self::new(vec![BookmarkNode {
            id: "1".to_string(),
            title: "书签栏".to_string(),
            url: None,
            date_added: 0,
            children: vec![
                BookmarkNode {
                    id: "2".to_string(),
                    title: "百度".to_string(),
                    url: Some("https://www.baidu.com".to_string()),
                    date_added: 1_701_963_225_419,
                    children: Vec::new(),
                },
                BookmarkNode {
                    id: "3".to_string(),
                    title: "谷歌".to_string(),
                    url: Some("https://www.google.com".to_string()),
                    date_added: 1_701_963_225_419,
                    children: Vec::new(),
                },
            ],
        }])
    }
}

impl BookmarkSource for MemoryBookmarkSource {
    fn get_tree(&self) -> AppResult<Vec<BookmarkNode>> {
        Ok(self.tree.clone())
    }

    fn search(&self, query: &str) -> AppResult<Vec<BookmarkNode>> {
        let query = query.to_lowercase();
        let mut out = Vec::new();
        Self::collect_matches(&self.tree, &query, &mut out);
        Ok(out)
    }

    fn remove(&mut self, id: &str) -> AppResult<()> {
        if Self::remove_by_id(&mut self.tree, id) {
            Ok(())
        } else {
            Err(AppError::Source(SourceError::BookmarkNotFound {
                id: id.to_string(),
            }))
        }
    }
}
