pub mod bookmark;
pub mod classification;

pub use bookmark::{Bookmark, BookmarkKind, BookmarkNode, BookmarkTreeItem};
pub use classification::{
    BulkCacheExport, CacheEntry, CacheIndexEntry, CacheStats, Category, ClassificationResult,
    ExportEnvelope, ExportInfo, ExportStatistics, RawCategory, RawClassification,
};
