//! 构建配置管理
//!
//! 配置来源按优先级：CLI 参数 > 环境变量 > TOML 配置文件 > 内置默认值。

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::translation::error::{TranslationError, TranslationResult};

/// 配置常量
pub mod constants {
    /// 默认语言列表，首个为源语言
    pub const DEFAULT_LOCALES: &[&str] = &["en", "ko", "zh", "ar", "pt", "es", "fr", "de", "ru"];

    pub const DEFAULT_SOURCE_LOCALE: &str = "en";

    /// 参与翻译的标签：承载叶级文本的块级与行内元素
    pub const TRANSLATABLE_TAGS: &[&str] = &[
        "p", "a", "span", "li", "th", "td", "b", "h1", "h2", "h3", "h4", "h5", "h6", "div",
    ];

    /// 在输出根目录下只拷贝一次的资源子目录
    pub const ASSET_DIRS: &[&str] = &["styles", "scripts", "images", "fonts", "video", "static"];

    pub const DEFAULT_API_URL: &str = "http://localhost:1188/translate";

    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const DEFAULT_CONFIG_FILE: &str = "polysite.toml";

    pub const ENV_API_URL: &str = "POLYSITE_API_URL";
    pub const ENV_TIMEOUT_SECS: &str = "POLYSITE_TIMEOUT_SECS";
    pub const ENV_LOCALES: &str = "POLYSITE_LOCALES";
}

/// 构建配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// 源语言代码
    pub source_locale: String,
    /// 目标语言列表（含源语言），决定所有组件的遍历域
    pub locales: Vec<String>,
    /// 参与翻译的标签名
    pub translatable_tags: Vec<String>,
    /// 输出根目录下拷贝一次的资源子目录
    pub asset_dirs: Vec<String>,
    /// 翻译接口地址
    pub api_url: String,
    /// 单次翻译请求的超时秒数
    pub request_timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_locale: constants::DEFAULT_SOURCE_LOCALE.to_string(),
            locales: constants::DEFAULT_LOCALES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            translatable_tags: constants::TRANSLATABLE_TAGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            asset_dirs: constants::ASSET_DIRS.iter().map(|s| s.to_string()).collect(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            request_timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BuildConfig {
    /// 加载配置文件；文件不存在时使用默认值
    pub fn load(path: Option<&Path>) -> TranslationResult<Self> {
        let path = path.unwrap_or_else(|| Path::new(constants::DEFAULT_CONFIG_FILE));
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let parsed: BuildConfig = toml::from_str(&raw)
                .map_err(|e| TranslationError::Config(format!("解析 {} 失败: {e}", path.display())))?;
            debug!(path = %path.display(), "配置文件已加载");
            parsed
        } else {
            BuildConfig::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// 用环境变量覆盖配置
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(constants::ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(raw) = std::env::var(constants::ENV_TIMEOUT_SECS) {
            if let Ok(secs) = raw.parse::<u64>() {
                self.request_timeout_secs = secs;
            }
        }
        if let Ok(raw) = std::env::var(constants::ENV_LOCALES) {
            let locales: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !locales.is_empty() {
                self.locales = locales;
            }
        }
    }

    /// 校验配置自洽
    pub fn validate(&self) -> TranslationResult<()> {
        if self.locales.is_empty() {
            return Err(TranslationError::Config("语言列表为空".to_string()));
        }
        if !self.locales.iter().any(|l| l == &self.source_locale) {
            return Err(TranslationError::Config(format!(
                "语言列表不包含源语言 {:?}",
                self.source_locale
            )));
        }
        if self.translatable_tags.is_empty() {
            return Err(TranslationError::Config("可翻译标签集为空".to_string()));
        }
        Ok(())
    }

    pub fn is_translatable_tag(&self, tag: &str) -> bool {
        self.translatable_tags.iter().any(|t| t == tag)
    }

    /// 除源语言外的目标语言
    pub fn target_locales(&self) -> impl Iterator<Item = &str> {
        self.locales
            .iter()
            .filter(|l| *l != &self.source_locale)
            .map(String::as_str)
    }
}
