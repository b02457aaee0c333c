//! 书签整理服务 - 业务能力层
//!
//! 把书签数据源返回的原始树节点规范化为统一的书签记录：
//! 有 URL 的节点是书签，没有的是文件夹；无标题节点补"未命名"。

use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::BookmarkSource;
use crate::models::{Bookmark, BookmarkKind, BookmarkNode, BookmarkTreeItem};

/// 书签整理服务
pub struct BookmarkService<B: BookmarkSource> {
    source: B,
}

impl<B: BookmarkSource> BookmarkService<B> {
    pub fn new(source: B) -> Self {
        Self { source }
    }

    /// 获取规范化后的完整书签树
    pub fn get_bookmark_tree(&self) -> AppResult<Vec<BookmarkTreeItem>> {
        let nodes = self.source.get_tree()?;
        Ok(process_bookmark_nodes(&nodes))
    }

    /// 搜索书签，返回规范化后的扁平列表（只含书签，不含文件夹）
    pub fn search_bookmarks(&self, query: &str) -> AppResult<Vec<Bookmark>> {
        let nodes = self.source.search(query)?;
        debug!("搜索 \"{}\" 命中 {} 条", query, nodes.len());
        Ok(nodes
            .iter()
            .filter(|node| node.url.is_some())
            .map(normalize_node)
            .collect())
    }

    /// 获取全部书签的扁平列表
    pub fn all_bookmarks(&self) -> AppResult<Vec<Bookmark>> {
        let tree = self.get_bookmark_tree()?;
        Ok(flatten_bookmarks(&tree))
    }

    /// 删除指定书签
    pub fn remove_bookmark(&mut self, id: &str) -> AppResult<()> {
        self.source.remove(id)
    }
}

/// 规范化原始树节点
fn process_bookmark_nodes(nodes: &[BookmarkNode]) -> Vec<BookmarkTreeItem> {
    nodes
        .iter()
        .map(|node| {
            let bookmark = normalize_node(node);
            BookmarkTreeItem {
                id: bookmark.id,
                title: bookmark.title,
                url: bookmark.url,
                date_added: bookmark.date_added,
                kind: bookmark.kind,
                children: process_bookmark_nodes(&node.children),
            }
        })
        .collect()
}

fn normalize_node(node: &BookmarkNode) -> Bookmark {
    Bookmark {
        id: node.id.clone(),
        title: if node.title.is_empty() {
            "未命名".to_string()
        } else {
            node.title.clone()
        },
        url: node.url.clone(),
        date_added: node.date_added,
        kind: if node.url.is_some() {
            BookmarkKind::Bookmark
        } else {
            BookmarkKind::Folder
        },
    }
}

/// 把规范化树压平为书签列表（深度优先，只收集书签节点）
pub fn flatten_bookmarks(items: &[BookmarkTreeItem]) -> Vec<Bookmark> {
    let mut out = Vec::new();
    collect_bookmarks(items, &mut out);
    out
}

fn collect_bookmarks(items: &[BookmarkTreeItem], out: &mut Vec<Bookmark>) {
    for item in items {
        if item.kind == BookmarkKind::Bookmark {
            out.push(item.to_bookmark());
        }
        collect_bookmarks(&item.children, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryBookmarkSource;

    #[test]
    fn test_tree_normalization_tags_type_by_url() {
        let service = BookmarkService::new(MemoryBookmarkSource::default());
        let tree = service.get_bookmark_tree().expect("获取失败");

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].kind, BookmarkKind::Folder);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].kind, BookmarkKind::Bookmark);
    }

    #[test]
    fn test_untitled_node_gets_default_title() {
        let source = MemoryBookmarkSource::new(vec![BookmarkNode {
            id: "9".to_string(),
            title: String::new(),
            url: Some("https://example.com".to_string()),
            date_added: 0,
            children: Vec::new(),
        }]);
        let service = BookmarkService::new(source);
        let tree = service.get_bookmark_tree().expect("获取失败");
        assert_eq!(tree[0].title, "未命名");
    }

    #[test]
    fn test_flatten_skips_folders_and_preserves_order() {
        let service = BookmarkService::new(MemoryBookmarkSource::default());
        let flat = service.all_bookmarks().expect("获取失败");

        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].title, "百度");
        assert_eq!(flat[1].title, "谷歌");
    }

    #[test]
    fn test_search_returns_normalized_bookmarks() {
        let service = BookmarkService::new(MemoryBookmarkSource::default());
        let hits = service.search_bookmarks("baidu").expect("搜索失败");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, BookmarkKind::Bookmark);
        assert_eq!(hits[0].title, "百度");
    }
}
