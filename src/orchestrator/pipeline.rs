//! 端到端流程 - 编排层
//!
//! 搜索书签 → 查缓存 → 分批分类 → 写缓存 → 导出四种格式。
//! 持有全部注入的能力，生命周期内复用。

use tracing::{info, warn};

use crate::api::{ChatApi, ChatClient};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{
    BookmarkSource, DownloadSink, FileDownloadSink, JsonFileStore, KeyValueStore,
    MemoryBookmarkSource,
};
use crate::models::{Bookmark, ClassificationResult};
use crate::orchestrator::BatchClassifier;
use crate::services::export_service;
use crate::services::{BookmarkService, CacheService, ClassifierService};

/// 应用主结构
pub struct App<C: ChatApi, S: KeyValueStore, B: BookmarkSource, D: DownloadSink> {
    config: Config,
    batch_classifier: BatchClassifier<C>,
    cache: CacheService<S>,
    bookmarks: BookmarkService<B>,
    sink: D,
}

impl App<ChatClient, JsonFileStore, MemoryBookmarkSource, FileDownloadSink> {
    /// 用默认能力初始化应用：
    /// 真实聊天客户端、JSON 文件缓存、开发桩书签源、文件下载
    pub fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let chat = ChatClient::new(&config);
        let store = JsonFileStore::open(&config.cache_file)?;
        let sink = FileDownloadSink::new(&config.output_dir);

        Ok(Self::with_parts(
            config,
            chat,
            store,
            MemoryBookmarkSource::default(),
            sink,
        ))
    }
}

impl<C: ChatApi, S: KeyValueStore, B: BookmarkSource, D: DownloadSink> App<C, S, B, D> {
    /// 用注入的能力组装应用（测试入口）
    pub fn with_parts(config: Config, chat: C, store: S, source: B, sink: D) -> Self {
        let classifier = ClassifierService::new(chat, config.clone());
        Self {
            config,
            batch_classifier: BatchClassifier::new(classifier),
            cache: CacheService::new(store),
            bookmarks: BookmarkService::new(source),
            sink,
        }
    }

    pub fn cache(&self) -> &CacheService<S> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut CacheService<S> {
        &mut self.cache
    }

    /// 运行端到端流程
    ///
    /// 空查询表示整理全部书签。已有同查询的缓存时直接复用，
    /// 不再发起远端调用。
    pub async fn run(&mut self, search_query: &str) -> AppResult<ClassificationResult> {
        // 收集书签
        let bookmarks = if search_query.is_empty() {
            self.bookmarks.all_bookmarks()?
        } else {
            self.bookmarks.search_bookmarks(search_query)?
        };

        if bookmarks.is_empty() {
            warn!("⚠️ 没有找到匹配的书签");
            return Err(AppError::Other(format!(
                "没有找到匹配的书签: {}",
                search_query
            )));
        }
        info!("✓ 找到 {} 条书签", bookmarks.len());

        // 命中缓存直接复用
        if let Some(cache_id) = self.cache.find_existing(search_query) {
            if let Some(entry) = self.cache.load(&cache_id) {
                info!("💾 命中缓存 ({})，跳过远端分类", cache_id);
                return Ok(entry.classification_result);
            }
        }

        // 分批分类
        let result = self.batch_classifier.classify_all(&bookmarks).await?;

        // 写缓存
        let cache_id = self.cache.save(search_query, &bookmarks, &result)?;
        info!("💾 分类结果已缓存，ID: {}", cache_id);

        // 导出四种格式
        self.export_all(&result, &bookmarks, search_query);

        log_final_stats(&result);

        Ok(result)
    }

    /// 把分类结果导出为全部四种格式并交给下载能力
    ///
    /// 单个格式保存失败只记录警告，不中断
    pub fn export_all(
        &self,
        result: &ClassificationResult,
        bookmarks: &[Bookmark],
        search_query: &str,
    ) {
        let jobs: [(&str, &str, String); 4] = [
            (
                "json",
                "application/json",
                export_service::export_as_json(result, bookmarks, search_query),
            ),
            (
                "txt",
                "text/plain",
                export_service::export_as_text(result, search_query),
            ),
            ("csv", "text/csv", export_service::export_as_csv(result)),
            (
                "html",
                "text/html",
                export_service::export_as_html(result, search_query),
            ),
        ];

        for (extension, mime_type, content) in jobs {
            let filename = export_service::generate_filename("bookmarks", extension, search_query);
            if !export_service::trigger_download(&self.sink, &content, &filename, mime_type) {
                warn!("⚠️ 导出 {} 失败", filename);
            }
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - AI 书签分类");
    info!("📊 批次大小: {}, 批次间隔: {}ms", config.batch_size, config.batch_delay_ms);
    info!("🤖 模型: {} @ {}", config.model_name, config.api_base_url);
    info!("{}", "=".repeat(60));
}

fn log_final_stats(result: &ClassificationResult) {
    info!("\n{}", "=".repeat(60));
    info!("📊 分类完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 书签总数: {}", result.total_bookmarks);
    info!("✅ 分类总数: {}", result.total_categories);
    info!("📋 {}", result.summary);
    info!("{}", "=".repeat(60));
}
