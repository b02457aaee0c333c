//! 分类结果缓存服务 - 业务能力层
//!
//! 在注入的键值存储之上维护两类数据：
//! - 完整条目：`bookmark_classification_<id>` → `CacheEntry`
//! - 索引列表：`bookmark_classification_list` → `Vec<CacheIndexEntry>`（新→旧）
//!
//! 索引是轻量摘要，列表展示不需要加载每个条目的书签数据。
//! 每次保存后无条件执行两条淘汰策略：超出条数上限从索引尾部淘汰，
//! 超过 30 天的条目全部清除。

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, CacheError};
use crate::infrastructure::KeyValueStore;
use crate::models::{
    Bookmark, BulkCacheExport, CacheEntry, CacheIndexEntry, CacheStats, ClassificationResult,
};

/// 完整条目的键前缀
pub const CACHE_PREFIX: &str = "bookmark_classification_";
/// 索引列表的键
pub const CACHE_LIST_KEY: &str = "bookmark_classification_list";
/// 最大缓存数量
pub const MAX_CACHE_SIZE: usize = 50;
/// 缓存保留期：30 天（毫秒）
const CACHE_TTL_MILLIS: i64 = 30 * 24 * 60 * 60 * 1000;

/// 分类结果缓存服务
pub struct CacheService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CacheService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 保存分类结果到缓存，返回缓存ID
    pub fn save(
        &mut self,
        search_query: &str,
        bookmarks: &[Bookmark],
        classification_result: &ClassificationResult,
    ) -> AppResult<String> {
        debug!(
            "保存分类结果到缓存: {}, 书签数量: {}",
            search_query,
            bookmarks.len()
        );

        let cache_id = generate_cache_id(search_query);
        let category_count = if classification_result.total_categories > 0 {
            classification_result.total_categories
        } else {
            classification_result.categories.len()
        };
        let entry = CacheEntry {
            id: cache_id.clone(),
            search_query: search_query.to_string(),
            bookmarks: bookmarks.to_vec(),
            classification_result: classification_result.clone(),
            created_at: Utc::now().timestamp_millis(),
            bookmark_count: bookmarks.len(),
            category_count,
        };

        // 保存完整条目
        let payload = serde_json::to_string(&entry)?;
        self.store
            .set(&format!("{}{}", CACHE_PREFIX, cache_id), &payload)?;
        debug!("缓存保存成功，ID: {}", cache_id);

        // 更新索引列表（新条目插入头部，超限从尾部淘汰）
        self.update_cache_list(&entry)?;

        // 清理过期缓存
        self.cleanup_old_cache();

        Ok(cache_id)
    }

    /// 从缓存加载分类结果
    ///
    /// 不存在或数据损坏都返回 None，不报错
    pub fn load(&self, cache_id: &str) -> Option<CacheEntry> {
        let payload = self.store.get(&format!("{}{}", CACHE_PREFIX, cache_id))?;
        match serde_json::from_str(&payload) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("加载缓存失败 ({}): {}", cache_id, e);
                None
            }
        }
    }

    /// 获取缓存索引列表（新→旧）
    ///
    /// 索引损坏时返回空列表，不报错
    pub fn list(&self) -> Vec<CacheIndexEntry> {
        let Some(payload) = self.store.get(CACHE_LIST_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&payload) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("获取缓存列表失败: {}", e);
                Vec::new()
            }
        }
    }

    /// 删除指定缓存（条目和索引行），不存在则为空操作
    pub fn delete(&mut self, cache_id: &str) -> AppResult<()> {
        self.store.remove(&format!("{}{}", CACHE_PREFIX, cache_id));

        let updated: Vec<CacheIndexEntry> = self
            .list()
            .into_iter()
            .filter(|item| item.id != cache_id)
            .collect();
        self.write_cache_list(&updated)
    }

    /// 清空所有缓存
    pub fn clear_all(&mut self) -> AppResult<()> {
        for item in self.list() {
            self.store.remove(&format!("{}{}", CACHE_PREFIX, item.id));
        }
        self.store.remove(CACHE_LIST_KEY);
        Ok(())
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        let cache_list = self.list();
        let mut total_size = 0usize;

        // 计算总缓存大小（近似值）
        for item in &cache_list {
            if let Some(payload) = self.store.get(&format!("{}{}", CACHE_PREFIX, item.id)) {
                total_size += payload.len();
            }
        }

        CacheStats {
            count: cache_list.len(),
            total_size: format!("{:.2} KB", total_size as f64 / 1024.0),
            max_size: MAX_CACHE_SIZE,
        }
    }

    /// 检查是否存在相同查询的缓存（大小写不敏感的精确匹配）
    pub fn find_existing(&self, search_query: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|item| item.search_query.to_lowercase() == search_query.to_lowercase())
            .map(|item| item.id)
    }

    /// 导出缓存数据为 JSON
    ///
    /// 指定ID时导出单个条目，否则导出全部条目的批量信封
    pub fn export(&self, cache_id: Option<&str>) -> AppResult<String> {
        match cache_id {
            Some(id) => {
                let entry = self.load(id).ok_or_else(|| {
                    AppError::Cache(CacheError::EntryNotFound { id: id.to_string() })
                })?;
                Ok(serde_json::to_string_pretty(&entry)?)
            }
            None => {
                let cache_data: Vec<CacheEntry> = self
                    .list()
                    .iter()
                    .filter_map(|item| self.load(&item.id))
                    .collect();
                let export = BulkCacheExport {
                    export_time: Utc::now().to_rfc3339(),
                    total_count: cache_data.len(),
                    cache_data,
                };
                Ok(serde_json::to_string_pretty(&export)?)
            }
        }
    }

    /// 导入缓存数据，返回成功导入的条数
    ///
    /// 支持三种格式：
    /// - 批量导出信封（`cacheData` 数组，单条失败跳过计数，不中断）
    /// - 单个裸条目（`searchQuery` + `classificationResult`）
    /// - 导出的分类结果信封（`exportInfo` + `originalBookmarks` + `classificationResult`）
    ///
    /// 三种格式都不匹配时报格式错误
    pub fn import(&mut self, json_data: &str) -> AppResult<usize> {
        debug!("开始导入缓存，数据长度: {}", json_data.len());

        let data: Value = serde_json::from_str(json_data).map_err(|e| {
            AppError::Cache(CacheError::InvalidJson {
                source: Box::new(e),
            })
        })?;

        if let Some(items) = data.get("cacheData").and_then(|v| v.as_array()) {
            // 批量导出格式
            debug!("检测到批量缓存数据，数量: {}", items.len());
            let mut imported = 0usize;
            for (index, item) in items.iter().enumerate() {
                match parse_bare_entry(item) {
                    Some((query, bookmarks, result)) => {
                        match self.save(&query, &bookmarks, &result) {
                            Ok(_) => {
                                imported += 1;
                                debug!("成功导入第 {} 个缓存: {}", index + 1, query);
                            }
                            Err(e) => warn!("导入第 {} 个缓存失败: {}", index + 1, e),
                        }
                    }
                    None => warn!("第 {} 个缓存数据格式不正确", index + 1),
                }
            }
            info!("导入完成，成功导入 {} 个缓存", imported);
            Ok(imported)
        } else if let Some((query, bookmarks, result)) = parse_bare_entry(&data) {
            // 单个裸条目格式
            debug!("检测到单个缓存数据: {}", query);
            self.save(&query, &bookmarks, &result)?;
            Ok(1)
        } else if let Some((query, bookmarks, result)) = parse_exported_result(&data) {
            // 导出的分类结果格式
            debug!("检测到导出的分类结果格式");
            self.save(&query, &bookmarks, &result)?;
            Ok(1)
        } else {
            let keys = match data.as_object() {
                Some(map) => map.keys().cloned().collect(),
                None => Vec::new(),
            };
            Err(AppError::Cache(CacheError::UnrecognizedFormat { keys }))
        }
    }

    // ==================== 私有方法 ====================

    fn write_cache_list(&mut self, list: &[CacheIndexEntry]) -> AppResult<()> {
        let payload = serde_json::to_string(list)?;
        self.store.set(CACHE_LIST_KEY, &payload)
    }

    /// 更新索引列表并执行条数上限淘汰
    fn update_cache_list(&mut self, entry: &CacheEntry) -> AppResult<()> {
        // 移除已存在的相同ID索引行
        let mut cache_list: Vec<CacheIndexEntry> = self
            .list()
            .into_iter()
            .filter(|item| item.id != entry.id)
            .collect();

        // 新条目插入列表开头（最新在前）
        cache_list.insert(
            0,
            CacheIndexEntry {
                id: entry.id.clone(),
                search_query: entry.search_query.clone(),
                created_at: entry.created_at,
                bookmark_count: entry.bookmark_count,
                category_count: entry.category_count,
            },
        );

        // 限制缓存数量：从尾部（最旧）淘汰并删除完整条目
        if cache_list.len() > MAX_CACHE_SIZE {
            let removed = cache_list.split_off(MAX_CACHE_SIZE);
            for item in removed {
                self.store.remove(&format!("{}{}", CACHE_PREFIX, item.id));
            }
        }

        self.write_cache_list(&cache_list)
    }

    /// 清理超过 30 天的缓存
    ///
    /// 淘汰本身的失败只记录日志，不影响保存操作
    fn cleanup_old_cache(&mut self) {
        let threshold = Utc::now().timestamp_millis() - CACHE_TTL_MILLIS;
        let cache_list = self.list();

        let valid: Vec<CacheIndexEntry> = cache_list
            .iter()
            .filter(|item| {
                if item.created_at < threshold {
                    self.store.remove(&format!("{}{}", CACHE_PREFIX, item.id));
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        if valid.len() != cache_list.len() {
            debug!("清理过期缓存: {} 条", cache_list.len() - valid.len());
            if let Err(e) = self.write_cache_list(&valid) {
                warn!("清理过期缓存失败: {}", e);
            }
        }
    }
}

// ==================== 辅助函数 ====================

/// 生成缓存ID：`hash(查询)_当前时间戳`
///
/// 哈希对同一查询稳定，时间戳避免重复查询之间的冲突
pub fn generate_cache_id(search_query: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    format!("{}_{}", simple_hash(search_query), timestamp)
}

/// 简单字符串哈希（32 位回绕运算），输出 36 进制短标记
pub fn simple_hash(input: &str) -> String {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    to_base36(hash.unsigned_abs() as u64)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = (value % 36) as u32;
        digits.push(char::from_digit(digit, 36).unwrap_or('0'));
        value /= 36;
    }
    digits.iter().rev().collect()
}

/// 从 JSON 值解析裸缓存条目（`searchQuery` + `classificationResult`，书签可缺省）
fn parse_bare_entry(value: &Value) -> Option<(String, Vec<Bookmark>, ClassificationResult)> {
    let query = value.get("searchQuery")?.as_str()?.to_string();
    let result: ClassificationResult =
        serde_json::from_value(value.get("classificationResult")?.clone()).ok()?;
    let bookmarks: Vec<Bookmark> = value
        .get("bookmarks")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    Some((query, bookmarks, result))
}

/// 从导出的分类结果信封解析（`exportInfo` + `originalBookmarks` + `classificationResult`）
fn parse_exported_result(value: &Value) -> Option<(String, Vec<Bookmark>, ClassificationResult)> {
    let export_info = value.get("exportInfo")?;
    let bookmarks: Vec<Bookmark> =
        serde_json::from_value(value.get("originalBookmarks")?.clone()).ok()?;
    let result: ClassificationResult =
        serde_json::from_value(value.get("classificationResult")?.clone()).ok()?;
    let query = export_info
        .get("searchQuery")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("导入的分类")
        .to_string();
    Some((query, bookmarks, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStore;
    use crate::models::Category;

    fn sample_result(total: usize) -> ClassificationResult {
        ClassificationResult {
            categories: vec![Category {
                name: "开发工具".to_string(),
                description: "工具类书签".to_string(),
                keywords: vec!["dev".to_string()],
                bookmarks: Vec::new(),
            }],
            summary: "完成".to_string(),
            total_bookmarks: total,
            total_categories: 1,
            classification_method: "精细主题分类".to_string(),
        }
    }

    fn sample_bookmarks() -> Vec<Bookmark> {
        vec![
            Bookmark::new("1", "Vue Guide", "https://vuejs.org"),
            Bookmark::new("2", "Rust Book", "https://doc.rust-lang.org/book"),
        ]
    }

    fn service() -> CacheService<MemoryStore> {
        CacheService::new(MemoryStore::new())
    }

    #[test]
    fn test_simple_hash_matches_reference_values() {
        // 哈希值必须与既有缓存文件中的 ID 兼容
        assert_eq!(simple_hash(""), "0");
        // "vue": h("v")=118, h("vu")=((118<<5)-118)+117=3775, h("vue")=((3775<<5)-3775)+101=117126
        // 117126 的 36 进制 = 2idi
        assert_eq!(simple_hash("vue"), "2idi");
        // 同一查询哈希稳定
        assert_eq!(simple_hash("书签"), simple_hash("书签"));
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let id = cache.save("vue", &bookmarks, &result).expect("保存失败");
        assert!(id.contains('_'));

        let entry = cache.load(&id).expect("应该能加载");
        assert_eq!(entry.search_query, "vue");
        assert_eq!(entry.bookmarks.len(), 2);
        assert_eq!(entry.bookmarks[0].title, "Vue Guide");
        assert_eq!(entry.classification_result.categories[0].name, "开发工具");
        assert_eq!(entry.bookmark_count, 2);
        assert_eq!(entry.category_count, 1);
    }

    #[test]
    fn test_load_missing_or_corrupt_returns_none() {
        let mut cache = service();
        assert!(cache.load("不存在").is_none());

        cache
            .store
            .set(&format!("{}bad", CACHE_PREFIX), "{损坏的数据")
            .expect("写入失败");
        assert!(cache.load("bad").is_none());
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        cache.save("第一", &bookmarks, &result).expect("保存失败");
        cache.save("第二", &bookmarks, &result).expect("保存失败");
        cache.save("第三", &bookmarks, &result).expect("保存失败");

        let list = cache.list();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].search_query, "第三");
        assert_eq!(list[2].search_query, "第一");
    }

    #[test]
    fn test_eviction_keeps_index_bounded() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let mut ids = Vec::new();
        for i in 0..(MAX_CACHE_SIZE + 5) {
            let id = cache
                .save(&format!("查询{}", i), &bookmarks, &result)
                .expect("保存失败");
            ids.push(id);
        }

        let list = cache.list();
        assert_eq!(list.len(), MAX_CACHE_SIZE);
        // 最早的 5 条已淘汰，完整条目也被删除
        for id in &ids[..5] {
            assert!(cache.load(id).is_none());
        }
        // 剩下的都还能加载
        for id in &ids[5..] {
            assert!(cache.load(id).is_some());
        }
    }

    #[test]
    fn test_cleanup_purges_entries_older_than_30_days() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let old_id = cache.save("旧查询", &bookmarks, &result).expect("保存失败");

        // 手工把索引里的时间戳改成 31 天前
        let mut list = cache.list();
        list[0].created_at -= 31 * 24 * 60 * 60 * 1000;
        cache.write_cache_list(&list).expect("写索引失败");

        // 下一次保存触发过期清理
        cache.save("新查询", &bookmarks, &result).expect("保存失败");

        let list = cache.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].search_query, "新查询");
        assert!(cache.load(&old_id).is_none());
    }

    #[test]
    fn test_delete_removes_entry_and_index_row() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let id = cache.save("vue", &bookmarks, &result).expect("保存失败");
        cache.delete(&id).expect("删除失败");

        assert!(cache.load(&id).is_none());
        assert!(cache.list().is_empty());

        // 重复删除是空操作
        cache.delete(&id).expect("删除失败");
    }

    #[test]
    fn test_clear_all() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let id1 = cache.save("一", &bookmarks, &result).expect("保存失败");
        let id2 = cache.save("二", &bookmarks, &result).expect("保存失败");

        cache.clear_all().expect("清空失败");

        assert!(cache.list().is_empty());
        assert!(cache.load(&id1).is_none());
        assert!(cache.load(&id2).is_none());
    }

    #[test]
    fn test_stats() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let stats = cache.stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.max_size, MAX_CACHE_SIZE);

        cache.save("vue", &bookmarks, &result).expect("保存失败");
        let stats = cache.stats();
        assert_eq!(stats.count, 1);
        assert!(stats.total_size.ends_with(" KB"));
    }

    #[test]
    fn test_find_existing_is_case_insensitive() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let id = cache.save("vue", &bookmarks, &result).expect("保存失败");

        assert_eq!(cache.find_existing("Vue"), Some(id.clone()));
        assert_eq!(cache.find_existing("VUE"), Some(id));
        assert_eq!(cache.find_existing("react"), None);
    }

    #[test]
    fn test_export_import_single_roundtrip() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let id = cache.save("vue", &bookmarks, &result).expect("保存失败");
        let blob = cache.export(Some(&id)).expect("导出失败");

        let mut other = service();
        let imported = other.import(&blob).expect("导入失败");
        assert_eq!(imported, 1);

        let new_id = other.find_existing("vue").expect("应该能找到");
        let entry = other.load(&new_id).expect("应该能加载");
        assert_eq!(entry.search_query, "vue");
        assert_eq!(entry.bookmarks.len(), 2);
        assert_eq!(
            entry.classification_result.categories[0].name,
            "开发工具"
        );
    }

    #[test]
    fn test_export_all_then_bulk_import() {
        let mut cache = service();
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        cache.save("一", &bookmarks, &result).expect("保存失败");
        cache.save("二", &bookmarks, &result).expect("保存失败");

        let blob = cache.export(None).expect("导出失败");
        let value: Value = serde_json::from_str(&blob).expect("导出应是JSON");
        assert_eq!(value["totalCount"], 2);
        assert!(value["exportTime"].is_string());

        let mut other = service();
        let imported = other.import(&blob).expect("导入失败");
        assert_eq!(imported, 2);
        assert_eq!(other.list().len(), 2);
    }

    #[test]
    fn test_bulk_import_skips_bad_items() {
        let mut cache = service();
        let blob = r#"{
            "exportTime": "2024-01-01T00:00:00Z",
            "totalCount": 2,
            "cacheData": [
                {"searchQuery": "好的", "classificationResult": {"categories": [], "summary": "", "totalBookmarks": 0, "totalCategories": 0}},
                {"别的字段": true}
            ]
        }"#;

        let imported = cache.import(blob).expect("导入失败");
        assert_eq!(imported, 1);
        assert_eq!(cache.list().len(), 1);
    }

    #[test]
    fn test_import_exported_result_envelope() {
        let mut cache = service();
        let blob = r#"{
            "exportInfo": {"exportTime": "2024-01-01T00:00:00Z", "searchQuery": "vue", "exportType": "classification_result", "version": "1.0"},
            "originalBookmarks": [{"id": "1", "title": "Vue Guide", "url": "https://vuejs.org", "dateAdded": 0, "type": "bookmark"}],
            "classificationResult": {"categories": [], "summary": "", "totalBookmarks": 1, "totalCategories": 0}
        }"#;

        let imported = cache.import(blob).expect("导入失败");
        assert_eq!(imported, 1);
        assert!(cache.find_existing("vue").is_some());
    }

    #[test]
    fn test_import_rejects_invalid_json_and_unknown_shape() {
        let mut cache = service();

        let err = cache.import("不是 json").unwrap_err();
        assert!(matches!(err, AppError::Cache(CacheError::InvalidJson { .. })));

        let err = cache.import(r#"{"随便": 1}"#).unwrap_err();
        assert!(matches!(
            err,
            AppError::Cache(CacheError::UnrecognizedFormat { .. })
        ));
    }

    #[test]
    fn test_save_surfaces_quota_error() {
        let mut cache = CacheService::new(MemoryStore::with_capacity_bytes(64));
        let bookmarks = sample_bookmarks();
        let result = sample_result(bookmarks.len());

        let err = cache.save("vue", &bookmarks, &result).unwrap_err();
        assert!(matches!(
            err,
            AppError::Cache(CacheError::QuotaExceeded { .. })
        ));
    }
}
