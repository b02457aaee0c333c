//! 导出服务 - 业务能力层
//!
//! 把分类结果渲染为 JSON / 文本 / CSV / HTML 四种格式。
//! 纯函数，无网络和存储副作用；产物交给下载能力保存。

use chrono::{Local, SecondsFormat, TimeZone, Utc};
use regex::Regex;

use crate::infrastructure::DownloadSink;
use crate::models::{
    Bookmark, ClassificationResult, ExportEnvelope, ExportInfo, ExportStatistics,
};

/// 导出分类结果为 JSON 信封（含统计信息）
pub fn export_as_json(
    classification_result: &ClassificationResult,
    original_bookmarks: &[Bookmark],
    search_query: &str,
) -> String {
    let now = Utc::now().to_rfc3339();
    let total_categories = classification_result.total_categories;
    let average = if total_categories > 0 {
        (original_bookmarks.len() as f64 / total_categories as f64).round() as usize
    } else {
        0
    };

    let export = ExportEnvelope {
        export_info: ExportInfo {
            export_time: now.clone(),
            search_query: search_query.to_string(),
            export_type: "classification_result".to_string(),
            version: "1.0".to_string(),
        },
        original_bookmarks: original_bookmarks.to_vec(),
        classification_result: classification_result.clone(),
        statistics: ExportStatistics {
            total_bookmarks: original_bookmarks.len(),
            total_categories,
            average_bookmarks_per_category: average,
            created_at: now,
        },
    };

    serde_json::to_string_pretty(&export).unwrap_or_default()
}

/// 导出分类结果为可读文本报告
pub fn export_as_text(classification_result: &ClassificationResult, search_query: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let query = if search_query.is_empty() {
        "全部书签"
    } else {
        search_query
    };
    let method = if classification_result.classification_method.is_empty() {
        "AI智能分类"
    } else {
        &classification_result.classification_method
    };

    let mut content = format!(
        "书签分类报告\n\
         =========================================\n\
         导出时间: {}\n\
         搜索关键词: {}\n\
         分类方法: {}\n\
         书签总数: {}\n\
         分类总数: {}\n\
         \n\
         分类总结:\n\
         {}\n\
         \n\
         =========================================\n\
         \n\
         详细分类结果:\n\n",
        timestamp,
        query,
        method,
        classification_result.total_bookmarks,
        classification_result.total_categories,
        classification_result.summary
    );

    for (index, category) in classification_result.categories.iter().enumerate() {
        content.push_str(&format!(
            "{}. {} ({}个书签)\n描述: {}",
            index + 1,
            category.name,
            category.bookmarks.len(),
            category.description
        ));

        if !category.keywords.is_empty() {
            content.push_str(&format!("\n关键词: {}", category.keywords.join(", ")));
        }

        content.push_str("\n书签列表:\n");

        for (bookmark_index, bookmark) in category.bookmarks.iter().enumerate() {
            content.push_str(&format!(
                "   {}. {}\n      网址: {}\n      添加时间: {}\n",
                bookmark_index + 1,
                bookmark.title,
                bookmark.url.as_deref().unwrap_or(""),
                format_millis_local(bookmark.date_added)
            ));
        }

        content.push_str(&format!("\n{}\n\n", "-".repeat(50)));
    }

    content
}

/// 导出分类结果为 CSV（每个书签一行，类别字段按行重复）
pub fn export_as_csv(classification_result: &ClassificationResult) -> String {
    let mut csv = String::from("Category,Description,Keywords,BookmarkTitle,BookmarkURL,DateAdded\n");

    for category in &classification_result.categories {
        let keywords = category.keywords.join(";");

        for bookmark in &category.bookmarks {
            let row = [
                csv_quote(&category.name),
                csv_quote(&category.description),
                csv_quote(&keywords),
                csv_quote(&bookmark.title),
                csv_quote(bookmark.url.as_deref().unwrap_or("")),
                csv_quote(&format_millis_iso(bookmark.date_added)),
            ]
            .join(",");
            csv.push_str(&row);
            csv.push('\n');
        }
    }

    csv
}

/// 导出分类结果为自包含的 HTML 报告
pub fn export_as_html(classification_result: &ClassificationResult, search_query: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let query = if search_query.is_empty() {
        "全部书签"
    } else {
        search_query
    };
    let average = if classification_result.total_categories > 0 {
        (classification_result.total_bookmarks as f64
            / classification_result.total_categories as f64)
            .round() as usize
    } else {
        0
    };

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>书签分类报告 - {query}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; line-height: 1.6; }}
        .header {{ background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .category {{ margin-bottom: 30px; border: 1px solid #ddd; border-radius: 8px; overflow: hidden; }}
        .category-header {{ background: #e3f2fd; padding: 15px; border-bottom: 1px solid #ddd; }}
        .category-title {{ font-size: 1.2em; font-weight: bold; margin: 0; color: #1976d2; }}
        .category-description {{ margin: 5px 0; color: #666; }}
        .keywords {{ margin: 10px 0; }}
        .keyword {{ background: #e1f5fe; padding: 2px 8px; border-radius: 12px; font-size: 0.8em; margin-right: 5px; }}
        .bookmarks {{ padding: 0; }}
        .bookmark {{ padding: 10px 15px; border-bottom: 1px solid #eee; }}
        .bookmark:last-child {{ border-bottom: none; }}
        .bookmark-title {{ font-weight: bold; color: #333; margin-bottom: 5px; }}
        .bookmark-url {{ color: #1976d2; text-decoration: none; font-size: 0.9em; }}
        .bookmark-date {{ color: #666; font-size: 0.8em; margin-top: 5px; }}
        .stats {{ display: flex; gap: 20px; }}
        .stat-item {{ text-align: center; }}
        .stat-number {{ font-size: 1.5em; font-weight: bold; color: #1976d2; }}
        .stat-label {{ color: #666; font-size: 0.9em; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>书签分类报告</h1>
        <div class="stats">
            <div class="stat-item">
                <div class="stat-number">{total_bookmarks}</div>
                <div class="stat-label">书签总数</div>
            </div>
            <div class="stat-item">
                <div class="stat-number">{total_categories}</div>
                <div class="stat-label">分类数量</div>
            </div>
            <div class="stat-item">
                <div class="stat-number">{average}</div>
                <div class="stat-label">平均每类</div>
            </div>
        </div>
        <p><strong>搜索关键词:</strong> {query}</p>
        <p><strong>导出时间:</strong> {timestamp}</p>
        <p><strong>分类总结:</strong> {summary}</p>
    </div>
"#,
        query = html_escape(query),
        total_bookmarks = classification_result.total_bookmarks,
        total_categories = classification_result.total_categories,
        average = average,
        timestamp = timestamp,
        summary = html_escape(&classification_result.summary),
    );

    for (index, category) in classification_result.categories.iter().enumerate() {
        html.push_str(&format!(
            r#"
    <div class="category">
        <div class="category-header">
            <h2 class="category-title">{}. {} ({}个书签)</h2>
            <p class="category-description">{}</p>"#,
            index + 1,
            html_escape(&category.name),
            category.bookmarks.len(),
            html_escape(&category.description)
        ));

        if !category.keywords.is_empty() {
            html.push_str("<div class=\"keywords\">");
            for keyword in &category.keywords {
                html.push_str(&format!(
                    "<span class=\"keyword\">{}</span>",
                    html_escape(keyword)
                ));
            }
            html.push_str("</div>");
        }

        html.push_str(
            r#"
        </div>
        <div class="bookmarks">"#,
        );

        for bookmark in &category.bookmarks {
            html.push_str(&format!(
                r#"
            <div class="bookmark">
                <div class="bookmark-title">{}</div>
                <a href="{}" class="bookmark-url" target="_blank">{}</a>
                <div class="bookmark-date">添加时间: {}</div>
            </div>"#,
                html_escape(&bookmark.title),
                html_escape(bookmark.url.as_deref().unwrap_or("")),
                html_escape(bookmark.url.as_deref().unwrap_or("")),
                format_millis_local(bookmark.date_added)
            ));
        }

        html.push_str(
            r#"
        </div>
    </div>"#,
        );
    }

    html.push_str("\n</body>\n</html>");
    html
}

/// 生成带时间戳的文件名，查询关键词中的特殊字符替换为下划线
pub fn generate_filename(base_name: &str, extension: &str, search_query: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
    let query_part = if search_query.is_empty() {
        String::new()
    } else if let Ok(re) = Regex::new(r"[^\w\u{4e00}-\u{9fa5}]") {
        format!("_{}", re.replace_all(search_query, "_"))
    } else {
        format!("_{}", search_query)
    };
    format!("{}{}_{}.{}", base_name, query_part, timestamp, extension)
}

/// 通过下载能力保存导出内容，返回是否成功
pub fn trigger_download(
    sink: &impl DownloadSink,
    content: &str,
    filename: &str,
    mime_type: &str,
) -> bool {
    sink.download(content, filename, mime_type)
}

// ==================== 辅助函数 ====================

fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn format_millis_local(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}

fn format_millis_iso(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => millis.to_string(),
    }
}
