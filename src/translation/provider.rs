//! 翻译服务抽象
//!
//! `TranslationProvider` 把外部翻译引擎当作黑盒：
//! `translate(text, target_locale) -> text`。重试、退避都不在这里，
//! 失败原样上抛，由缓存层决定留空回退。
//!
//! `HttpProvider` 对接 DeepLX 风格的 JSON 端点
//! （默认 `http://localhost:1188/translate`）。

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::translation::error::{TranslationError, TranslationResult};

/// 外部翻译能力
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// 把源语言文本翻译到目标语言
    async fn translate(&self, text: &str, target_locale: &str) -> TranslationResult<String>;
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    code: i64,
    data: Option<String>,
}

/// 基于 HTTP 的翻译服务客户端
///
/// 每次请求带超时，超时视同服务失败（上层留空回退）。
pub struct HttpProvider {
    client: reqwest::Client,
    endpoint: String,
    source_locale: String,
}

impl HttpProvider {
    pub fn new(
        endpoint: &str,
        source_locale: &str,
        timeout: Duration,
    ) -> TranslationResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            source_locale: source_locale.to_uppercase(),
        })
    }
}

#[async_trait]
impl TranslationProvider for HttpProvider {
    async fn translate(&self, text: &str, target_locale: &str) -> TranslationResult<String> {
        let target_lang = target_locale.to_uppercase();
        let request = TranslateRequest {
            text,
            source_lang: &self.source_locale,
            target_lang: &target_lang,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Provider(format!(
                "翻译接口返回 HTTP {status}"
            )));
        }
        let body: TranslateResponse = response.json().await?;
        if body.code != 200 {
            return Err(TranslationError::Provider(format!(
                "翻译接口返回 code {}",
                body.code
            )));
        }
        match body.data {
            Some(data) if !data.trim().is_empty() => {
                debug!(target = %target_locale, chars = text.chars().count(), "翻译完成");
                Ok(data)
            }
            _ => Err(TranslationError::Provider("翻译接口返回空译文".to_string())),
        }
    }
}

/// 确定性的测试用翻译服务
///
/// 译文形如 `[locale] 原文`，可配置对特定原文报错，
/// 用于验证留空回退路径。
#[derive(Default)]
pub struct MockProvider {
    failing_texts: HashSet<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让指定原文的翻译请求失败
    pub fn fail_on(mut self, text: &str) -> Self {
        self.failing_texts.insert(text.to_string());
        self
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn translate(&self, text: &str, target_locale: &str) -> TranslationResult<String> {
        if self.failing_texts.contains(text) {
            return Err(TranslationError::Provider(format!(
                "模拟翻译失败: {text:?}"
            )));
        }
        Ok(format!("[{target_locale}] {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_is_deterministic() {
        let provider = MockProvider::new();
        let a = provider.translate("Welcome Home", "es").await.unwrap();
        let b = provider.translate("Welcome Home", "es").await.unwrap();
        assert_eq!(a, "[es] Welcome Home");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn mock_failure_is_a_provider_error() {
        let provider = MockProvider::new().fail_on("Welcome Home");
        let err = provider.translate("Welcome Home", "es").await.unwrap_err();
        assert!(matches!(err, TranslationError::Provider(_)));
        // 其他文本不受影响
        assert!(provider.translate("Goodbye", "es").await.is_ok());
    }
}
