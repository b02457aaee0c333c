use serde::{Deserialize, Serialize};

use crate::models::bookmark::Bookmark;

/// 一个分类：一组主题相同的书签
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

/// 分类结果
///
/// 不变量：`total_categories == categories.len()`；
/// `total_bookmarks` 等于产生该结果的输入书签数量
/// （不一定等于实际归入分类的数量，因为无效条目会被过滤）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub total_bookmarks: usize,
    #[serde(default)]
    pub total_categories: usize,
    /// 分类方法标记（"精细主题分类" / "默认分类"，合并结果为空）
    #[serde(default)]
    pub classification_method: String,
}

// ========== LLM 回复的原始 JSON 形状 ==========

/// LLM 回复中单个分类的原始形状（书签为 1 基序号）
#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bookmarks: Vec<i64>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// LLM 回复的原始形状
#[derive(Debug, Clone, Deserialize)]
pub struct RawClassification {
    pub categories: Vec<RawCategory>,
    #[serde(default)]
    pub summary: Option<String>,
}

// ========== 缓存数据形状 ==========

/// 一次分类运行的完整缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub id: String,
    pub search_query: String,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    pub classification_result: ClassificationResult,
    /// 创建时间（epoch 毫秒）
    pub created_at: i64,
    #[serde(default)]
    pub bookmark_count: usize,
    #[serde(default)]
    pub category_count: usize,
}

/// 缓存索引条目（轻量摘要，列表展示不需要加载完整书签数据）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheIndexEntry {
    pub id: String,
    pub search_query: String,
    pub created_at: i64,
    #[serde(default)]
    pub bookmark_count: usize,
    #[serde(default)]
    pub category_count: usize,
}

/// 缓存统计信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub count: usize,
    /// 近似的总序列化大小，如 "12.34 KB"
    pub total_size: String,
    pub max_size: usize,
}

/// 批量缓存导出信封
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCacheExport {
    pub export_time: String,
    pub total_count: usize,
    pub cache_data: Vec<CacheEntry>,
}

// ========== 导出文件形状 ==========

/// 导出文件的元信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    pub export_time: String,
    pub search_query: String,
    pub export_type: String,
    pub version: String,
}

/// 导出文件的统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatistics {
    pub total_bookmarks: usize,
    pub total_categories: usize,
    pub average_bookmarks_per_category: usize,
    pub created_at: String,
}

/// JSON 导出信封
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub export_info: ExportInfo,
    pub original_bookmarks: Vec<Bookmark>,
    pub classification_result: ClassificationResult,
    pub statistics: ExportStatistics,
}
