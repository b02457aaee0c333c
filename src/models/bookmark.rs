use serde::{Deserialize, Serialize};

/// 书签类型
///
/// 由是否存在 URL 决定：有 URL 的是书签，没有的是文件夹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkKind {
    Bookmark,
    Folder,
}

impl Default for BookmarkKind {
    fn default() -> Self {
        BookmarkKind::Bookmark
    }
}

/// 规范化后的书签记录
///
/// `id` 由书签数据源分配，在整个流水线中保持不变
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 添加时间（epoch 毫秒）
    #[serde(default)]
    pub date_added: i64,
    #[serde(rename = "type", default)]
    pub kind: BookmarkKind,
}

impl Bookmark {
    /// 创建一条书签记录（测试和开发桩数据常用）
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
            date_added: 0,
            kind: BookmarkKind::Bookmark,
        }
    }
}

/// 书签数据源返回的原始树节点
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub date_added: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNode>,
}

/// 规范化后的书签树节点
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkTreeItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub date_added: i64,
    #[serde(rename = "type")]
    pub kind: BookmarkKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkTreeItem>,
}

impl BookmarkTreeItem {
    /// 转换为扁平的书签记录（不含子节点）
    pub fn to_bookmark(&self) -> Bookmark {
        Bookmark {
            id: self.id.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            date_added: self.date_added,
            kind: self.kind,
        }
    }
}
