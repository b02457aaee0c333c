//! 批量分类处理器 - 编排层
//!
//! 大书签集合按固定批次大小切分，串行发给分类服务，
//! 批次之间插入固定延迟以避免触发远端服务的频率限制。
//! 各批次的部分结果按类别名（大小写不敏感）合并为统一结果。

use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use crate::api::ChatApi;
use crate::error::AppResult;
use crate::models::{Bookmark, ClassificationResult};
use crate::services::ClassifierService;

/// 批量分类处理器
pub struct BatchClassifier<C: ChatApi> {
    classifier: ClassifierService<C>,
    batch_size: usize,
    batch_delay: Duration,
}

impl<C: ChatApi> BatchClassifier<C> {
    pub fn new(classifier: ClassifierService<C>) -> Self {
        let batch_size = classifier.config().batch_size;
        let batch_delay = Duration::from_millis(classifier.config().batch_delay_ms);
        Self {
            classifier,
            batch_size,
            batch_delay,
        }
    }

    /// 对全部书签分类（使用配置的批次大小）
    pub async fn classify_all(&self, bookmarks: &[Bookmark]) -> AppResult<ClassificationResult> {
        self.classify_all_with(bookmarks, self.batch_size).await
    }

    /// 对全部书签分类（指定批次大小）
    ///
    /// 小于等于一个批次时直接委托分类服务；否则按顺序切分、
    /// 串行分类再合并。任何一批传输失败都会中止整个操作，
    /// 不返回部分结果。
    pub async fn classify_all_with(
        &self,
        bookmarks: &[Bookmark],
        batch_size: usize,
    ) -> AppResult<ClassificationResult> {
        if bookmarks.len() <= batch_size {
            return self.classifier.classify_bookmarks(bookmarks).await;
        }

        let batches: Vec<&[Bookmark]> = bookmarks.chunks(batch_size).collect();
        let total_batches = batches.len();
        let mut results = Vec::with_capacity(total_batches);

        for (index, batch) in batches.iter().enumerate() {
            info!("📦 处理第 {}/{} 批书签...", index + 1, total_batches);
            let result = self.classifier.classify_bookmarks(batch).await?;
            results.push(result);

            // 避免API限制，批次之间添加延迟（最后一批之后不等）
            if index + 1 < total_batches {
                sleep(self.batch_delay).await;
            }
        }

        Ok(merge_classification_results(results))
    }
}

/// 合并多个批次的分类结果
///
/// 类别名大小写不敏感匹配；撞名时先出现的类别保留自己的
/// 描述和关键词，后来者只追加书签（保持各批内部顺序）。
/// 新名字按首次出现顺序追加。
pub fn merge_classification_results(results: Vec<ClassificationResult>) -> ClassificationResult {
    let batch_count = results.len();
    let mut merged = Vec::<crate::models::Category>::new();
    let mut total_bookmarks = 0usize;

    for result in results {
        total_bookmarks += result.total_bookmarks;
        for category in result.categories {
            let existing = merged
                .iter()
                .position(|c| c.name.to_lowercase() == category.name.to_lowercase());
            match existing {
                Some(index) => merged[index].bookmarks.extend(category.bookmarks),
                None => merged.push(category),
            }
        }
    }

    let total_categories = merged.len();

    ClassificationResult {
        categories: merged,
        summary: format!("成功合并 {} 批次的分类结果", batch_count),
        total_bookmarks,
        total_categories,
        classification_method: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn result_with(categories: Vec<(&str, Vec<&str>)>, total: usize) -> ClassificationResult {
        let categories: Vec<Category> = categories
            .into_iter()
            .map(|(name, titles)| Category {
                name: name.to_string(),
                description: format!("{} 的描述", name),
                keywords: vec![name.to_lowercase()],
                bookmarks: titles
                    .into_iter()
                    .enumerate()
                    .map(|(i, t)| Bookmark::new(i.to_string(), t, "https://example.com"))
                    .collect(),
            })
            .collect();
        let total_categories = categories.len();
        ClassificationResult {
            categories,
            summary: "done".to_string(),
            total_bookmarks: total,
            total_categories,
            classification_method: "精细主题分类".to_string(),
        }
    }

    #[test]
    fn test_merge_case_insensitive_names() {
        let merged = merge_classification_results(vec![
            result_with(vec![("Vue.js", vec!["a"]), ("新闻", vec!["b"])], 2),
            result_with(vec![("vue.JS", vec!["c"])], 1),
        ]);

        assert_eq!(merged.total_categories, 2);
        assert_eq!(merged.categories.len(), 2);
        // 首见类别的名字和元数据保留，书签按批次顺序追加
        assert_eq!(merged.categories[0].name, "Vue.js");
        assert_eq!(merged.categories[0].description, "Vue.js 的描述");
        let titles: Vec<&str> = merged.categories[0]
            .bookmarks
            .iter()
            .map(|b| b.title.as_str())
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
        assert_eq!(merged.total_bookmarks, 3);
        assert_eq!(merged.summary, "成功合并 2 批次的分类结果");
    }

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let merged = merge_classification_results(vec![
            result_with(vec![("甲", vec!["a"])], 1),
            result_with(vec![("乙", vec!["b"]), ("甲", vec!["c"])], 2),
            result_with(vec![("丙", vec!["d"])], 1),
        ]);

        let names: Vec<&str> = merged.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["甲", "乙", "丙"]);
    }

    #[test]
    fn test_merge_is_associative_over_names() {
        let a = || result_with(vec![("甲", vec!["a"])], 1);
        let b = || result_with(vec![("甲", vec!["b"]), ("乙", vec!["x"])], 2);
        let c = || result_with(vec![("乙", vec!["y"])], 1);

        let left = merge_classification_results(vec![
            merge_classification_results(vec![a(), b()]),
            c(),
        ]);
        let right = merge_classification_results(vec![
            a(),
            merge_classification_results(vec![b(), c()]),
        ]);

        let names = |r: &ClassificationResult| {
            r.categories
                .iter()
                .map(|cat| {
                    (
                        cat.name.clone(),
                        cat.bookmarks
                            .iter()
                            .map(|b| b.title.clone())
                            .collect::<Vec<_>>(),
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&left), names(&right));
    }

    #[test]
    fn test_merge_empty_input() {
        let merged = merge_classification_results(Vec::new());
        assert_eq!(merged.total_bookmarks, 0);
        assert_eq!(merged.total_categories, 0);
        assert!(merged.categories.is_empty());
    }
}
