//! 聊天补全 API 模块
//!
//! 封装与远端聊天服务的交互：
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 DeepSeek, Azure, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;

/// 聊天补全能力
///
/// 分类服务通过该 trait 调用远端模型，测试时可替换为桩实现
pub trait ChatApi {
    fn chat(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

impl<T: ChatApi + Sync> ChatApi for std::sync::Arc<T> {
    fn chat(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        (**self).chat(user_message, system_message)
    }
}

/// 聊天客户端
pub struct ChatClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    /// 创建新的聊天客户端
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.model_name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl ChatApi for ChatClient {
    /// 发送聊天请求
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回模型的响应内容（字符串）
    async fn chat(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用聊天 API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        // 添加用户消息
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("聊天 API 调用失败: {}", e);
            anyhow::anyhow!("聊天 API 调用失败: {}", e)
        })?;

        debug!("聊天 API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("模型返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}
