//! # Polysite Library
//!
//! 把单语言 HTML 内容树构建为多语言静态站点。
//!
//! ## 模块组织
//!
//! - `core` - 构建编排和主要处理逻辑
//! - `html` - HTML 解析、序列化与链接重写
//! - `translation` - 键派生、字符串目录、翻译缓存与文档重写

pub mod core;
pub mod html;
pub mod translation;

// Re-export commonly used items for convenience
pub use crate::core::{build_site, BuildOptions, BuildSummary};
pub use crate::translation::config::BuildConfig;
pub use crate::translation::error::{TranslationError, TranslationResult};
