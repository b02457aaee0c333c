//! 书签分类服务 - 业务能力层
//!
//! 只负责"一批书签 → 一个分类结果"的能力，不关心分批和合并。
//!
//! 模型的回复是不可信的自由文本：解析必须是防御性的，
//! 解析失败时降级为单个"未分类"兜底结果，绝不让整个流水线崩溃
//! （调用方此时已经花掉了一次网络往返和配额）。

use tracing::{debug, warn};

use crate::api::ChatApi;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{Bookmark, Category, ClassificationResult, RawClassification};

/// 系统消息：把模型定位为书签分类助手
const SYSTEM_MESSAGE: &str =
    "你是一个专业的书签分类助手。请根据书签的标题和URL，将它们按照用途和主题进行智能分类。";

/// 分类方法标记：成功路径
pub const METHOD_FINE_GRAINED: &str = "精细主题分类";
/// 分类方法标记：解析失败的兜底路径
pub const METHOD_DEFAULT: &str = "默认分类";

/// 书签分类服务
pub struct ClassifierService<C: ChatApi> {
    chat: C,
    config: Config,
}

impl<C: ChatApi> ClassifierService<C> {
    pub fn new(chat: C, config: Config) -> Self {
        Self { chat, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 对一批书签进行分类
    ///
    /// 配置缺失和传输失败会返回错误；模型回复解析失败不会，
    /// 而是降级为"未分类"兜底结果
    pub async fn classify_bookmarks(
        &self,
        bookmarks: &[Bookmark],
    ) -> AppResult<ClassificationResult> {
        // 检查配置
        self.config.validate()?;

        debug!("开始分类，书签数量: {}", bookmarks.len());

        // 构建提示词
        let prompt = build_classification_prompt(bookmarks);

        let reply = self
            .chat
            .chat(&prompt, Some(SYSTEM_MESSAGE))
            .await
            .map_err(|e| {
                crate::error::AppError::llm_api_failed(self.config.model_name.clone(), e)
            })?;

        debug!("模型回复: {}", crate::utils::logging::truncate_text(&reply, 200));

        // 解析分类结果
        Ok(parse_classification_result(&reply, bookmarks))
    }
}

/// 构建分类提示词
///
/// 书签以 1 基序号列出，要求模型按精细主题分类并以严格 JSON 格式回复
pub fn build_classification_prompt(bookmarks: &[Bookmark]) -> String {
    let bookmark_list = bookmarks
        .iter()
        .enumerate()
        .map(|(index, bookmark)| {
            format!(
                "{}. 标题: \"{}\" | URL: {}",
                index + 1,
                bookmark.title,
                bookmark.url.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"请将以下书签按照具体的功能主题进行精细分类。重点是要识别书签的具体内容主题，而不是宽泛的大方向分类。

书签列表：
{}

分类要求：
1. **精细主题分类**：要按照具体的功能主题分类，例如：
   - "AI模型" 而不是 "技术讨论"
   - "Vue.js开发" 而不是 "前端开发"
   - "机器学习教程" 而不是 "学习资源"
   - "股票分析" 而不是 "财经资讯"
   - "摄影技巧" 而不是 "兴趣爱好"

2. **具体场景识别**：
   - 仔细分析标题中的关键词，识别具体的技术栈、产品名称、应用场景
   - 从URL域名判断网站性质和专业领域
   - 优先按照专业领域和具体用途分类

3. **分类粒度**：
   - 避免使用过于宽泛的分类名称
   - 每个分类应该代表一个明确的主题或用途
   - 相似的具体主题才归为一类

4. **示例对比**：
   ❌ 宽泛分类：技术讨论、开发工具、学习资源
   ✅ 精细分类：AI模型评测、React组件库、Python数据分析

请按照以下JSON格式返回分类结果：
{{
  "categories": [
    {{
      "name": "具体主题名称",
      "description": "该主题的详细描述，说明包含什么类型的内容",
      "bookmarks": [书签在原列表中的序号],
      "keywords": ["相关关键词1", "关键词2"]
    }}
  ],
  "summary": "分类总结说明"
}}

特别注意：
- 分类名称要体现具体的主题内容，不要使用模糊的大类名称
- 每个书签都必须被分配到最匹配的具体主题分类中
- 如果某个书签主题很独特，可以单独成为一个类别
- 优先按照内容的专业性和具体用途进行分类"#,
        bookmark_list
    )
}

/// 解析模型回复
///
/// 序号映射回原始书签对象，越界序号直接丢弃；
/// 解析失败时返回"未分类"兜底结果
pub fn parse_classification_result(
    reply: &str,
    original_bookmarks: &[Bookmark],
) -> ClassificationResult {
    match try_parse(reply, original_bookmarks) {
        Ok(result) => result,
        Err(reason) => {
            warn!("解析分类结果失败: {}", reason);
            fallback_classification(original_bookmarks)
        }
    }
}

fn try_parse(reply: &str, original_bookmarks: &[Bookmark]) -> Result<ClassificationResult, String> {
    let json_span = extract_json_object(reply).ok_or_else(|| "回复中没有JSON对象".to_string())?;

    let raw: RawClassification =
        serde_json::from_str(json_span).map_err(|e| format!("JSON解析失败: {}", e))?;

    // 将 1 基序号转换为实际的书签对象，越界序号丢弃
    let categories: Vec<Category> = raw
        .categories
        .into_iter()
        .map(|category| Category {
            name: category.name,
            description: category.description,
            keywords: category.keywords,
            bookmarks: category
                .bookmarks
                .iter()
                .filter_map(|&index| {
                    if index >= 1 && (index as usize) <= original_bookmarks.len() {
                        Some(original_bookmarks[index as usize - 1].clone())
                    } else {
                        debug!("丢弃越界的书签序号: {}", index);
                        None
                    }
                })
                .collect(),
        })
        .collect();

    let total_categories = categories.len();

    Ok(ClassificationResult {
        categories,
        summary: raw.summary.unwrap_or_else(|| "书签分类完成".to_string()),
        total_bookmarks: original_bookmarks.len(),
        total_categories,
        classification_method: METHOD_FINE_GRAINED.to_string(),
    })
}

/// 兜底分类：所有书签归入单个"未分类"类别
fn fallback_classification(original_bookmarks: &[Bookmark]) -> ClassificationResult {
    ClassificationResult {
        categories: vec![Category {
            name: "未分类".to_string(),
            description: "无法自动分类的书签".to_string(),
            keywords: Vec::new(),
            bookmarks: original_bookmarks.to_vec(),
        }],
        summary: "分类解析失败，所有书签归为未分类".to_string(),
        total_bookmarks: original_bookmarks.len(),
        total_categories: 1,
        classification_method: METHOD_DEFAULT.to_string(),
    }
}

/// 从自由文本中提取第一个配对完整的 `{...}` 片段
///
/// 模型可能在 JSON 前后夹带说明文字。这里用显式的括号配对扫描
/// （跳过字符串字面量内的括号），而不是贪婪正则，
/// 以正确处理 `description` 字符串内的嵌套括号。
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_batch() -> Vec<Bookmark> {
        vec![
            Bookmark::new("1", "Vue Guide", "https://vuejs.org"),
            Bookmark::new("2", "Stock News", "https://finance.example.com"),
        ]
    }

    #[test]
    fn test_extract_json_with_surrounding_prose() {
        let text = "好的，结果如下：{\"a\": 1} 希望对你有帮助";
        assert_eq!(extract_json_object(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_with_nested_braces_in_string() {
        let text = r#"前言 {"description": "包含 {嵌套} 和 \"引号\" 的文本", "n": {"x": 1}} 后记"#;
        let span = extract_json_object(text).expect("应该提取到JSON");
        assert!(span.starts_with('{') && span.ends_with('}'));
        let value: serde_json::Value = serde_json::from_str(span).expect("片段应是合法JSON");
        assert_eq!(value["n"]["x"], 1);
    }

    #[test]
    fn test_extract_json_none_without_brace() {
        assert_eq!(extract_json_object("没有任何对象"), None);
    }

    #[test]
    fn test_parse_maps_indices_and_drops_missing() {
        let batch = sample_batch();
        let reply = r#"Sure! {"categories":[{"name":"Vue.js","description":"Vue docs","bookmarks":[1],"keywords":["vue"]}],"summary":"done"}"#;

        let result = parse_classification_result(reply, &batch);

        assert_eq!(result.classification_method, METHOD_FINE_GRAINED);
        assert_eq!(result.total_categories, 1);
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].name, "Vue.js");
        // 只有序号 1 被分配；序号 2 未出现在回复中，不会被自动补入
        assert_eq!(result.categories[0].bookmarks.len(), 1);
        assert_eq!(result.categories[0].bookmarks[0].title, "Vue Guide");
        // totalBookmarks 是输入数量，不是实际归类数量
        assert_eq!(result.total_bookmarks, 2);
        assert_eq!(result.summary, "done");
    }

    #[test]
    fn test_parse_drops_out_of_range_indices() {
        let batch = sample_batch();
        let reply = r#"{"categories":[{"name":"混合","description":"","bookmarks":[0, 1, 2, 3, -5],"keywords":[]}],"summary":"ok"}"#;

        let result = parse_classification_result(reply, &batch);

        // 0、3、-5 越界被丢弃，只剩 1 和 2
        assert_eq!(result.categories[0].bookmarks.len(), 2);
    }

    #[test]
    fn test_parse_defaults_for_missing_fields() {
        let batch = sample_batch();
        let reply = r#"{"categories":[{"name":"Vue.js","description":"d","bookmarks":[1,2]}]}"#;

        let result = parse_classification_result(reply, &batch);

        assert!(result.categories[0].keywords.is_empty());
        assert_eq!(result.summary, "书签分类完成");
    }

    #[test]
    fn test_parse_falls_back_without_json() {
        let batch = sample_batch();
        let result = parse_classification_result("抱歉，我无法完成这个任务", &batch);

        assert_eq!(result.classification_method, METHOD_DEFAULT);
        assert_eq!(result.total_categories, 1);
        assert_eq!(result.categories[0].name, "未分类");
        // 兜底类别包含全部输入书签
        assert_eq!(result.categories[0].bookmarks.len(), 2);
        assert_eq!(result.total_bookmarks, 2);
    }

    #[test]
    fn test_parse_falls_back_on_malformed_json() {
        let batch = sample_batch();
        let result = parse_classification_result(r#"{"categories": [}"#, &batch);
        assert_eq!(result.classification_method, METHOD_DEFAULT);
    }

    #[test]
    fn test_prompt_numbers_bookmarks_from_one() {
        let prompt = build_classification_prompt(&sample_batch());
        assert!(prompt.contains("1. 标题: \"Vue Guide\" | URL: https://vuejs.org"));
        assert!(prompt.contains("2. 标题: \"Stock News\" | URL: https://finance.example.com"));
        assert!(prompt.contains("\"categories\""));
    }
}
