//! 翻译模块
//!
//! 提供多语言构建的核心能力：
//! - **keys**: 源文本到候选键的派生
//! - **catalog**: 键与规范文本的权威目录
//! - **cache**: (键, 语言) 译文缓存
//! - **provider**: 外部翻译服务抽象
//! - **rewriter**: 单文档翻译重写
//! - **store**: redb 持久化存储
//! - **config**: 构建配置
//! - **error**: 统一错误处理

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod keys;
pub mod provider;
pub mod rewriter;
pub mod store;

pub use cache::{CacheStats, TranslationCache};
pub use catalog::StringCatalog;
pub use config::BuildConfig;
pub use error::{TranslationError, TranslationResult};
pub use keys::derive_key;
pub use provider::{HttpProvider, MockProvider, TranslationProvider};
pub use rewriter::DocumentRewriter;
pub use store::LocaleStore;
