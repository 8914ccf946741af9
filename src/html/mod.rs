//! HTML 解析和处理模块
//!
//! - `dom`: 基础 DOM 操作
//! - `serializer`: 序列化功能
//! - `links`: 语言作用域链接重写

pub mod dom;
pub mod links;
pub mod serializer;

pub use dom::{get_node_attr, get_node_name, html_to_dom, set_node_attr};
pub use links::{localize_href, rewrite_locale_links};
pub use serializer::serialize_document;
