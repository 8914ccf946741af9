//! 语言作用域链接重写
//!
//! 把指向源语言路径段的锚点链接改指当前语言的路径段，
//! 其余链接原样保留。

use markup5ever_rcdom::{Handle, NodeData};

use crate::html::dom::{get_node_attr, get_node_name, set_node_attr};

/// 递归遍历 DOM 树并重写锚点链接
pub fn rewrite_locale_links(node: &Handle, source_locale: &str, target_locale: &str) {
    match node.data {
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                rewrite_locale_links(child, source_locale, target_locale);
            }
        }
        NodeData::Element { .. } => {
            if get_node_name(node) == Some("a") {
                if let Some(href) = get_node_attr(node, "href") {
                    if let Some(localized) = localize_href(&href, source_locale, target_locale) {
                        set_node_attr(node, "href", Some(localized));
                    }
                }
            }
            for child in node.children.borrow().iter() {
                rewrite_locale_links(child, source_locale, target_locale);
            }
        }
        _ => {}
    }
}

/// 判定并改写单个链接目标
///
/// 仅命中源语言路径段（`/en/...`、`en/...` 或恰好 `/en`）的链接；
/// `/static/logo.png` 一类不属于源语言段的目标返回 `None`。
pub fn localize_href(href: &str, source_locale: &str, target_locale: &str) -> Option<String> {
    let absolute_prefix = format!("/{source_locale}/");
    let relative_prefix = format!("{source_locale}/");
    let bare = format!("/{source_locale}");

    if let Some(rest) = href.strip_prefix(&absolute_prefix) {
        Some(format!("/{target_locale}/{rest}"))
    } else if href == bare {
        Some(format!("/{target_locale}"))
    } else if let Some(rest) = href.strip_prefix(&relative_prefix) {
        Some(format!("{target_locale}/{rest}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_source_locale_paths() {
        assert_eq!(
            localize_href("/en/products.html", "en", "fr"),
            Some("/fr/products.html".to_string())
        );
        assert_eq!(
            localize_href("en/products.html", "en", "de"),
            Some("de/products.html".to_string())
        );
        assert_eq!(localize_href("/en", "en", "es"), Some("/es".to_string()));
    }

    #[test]
    fn leaves_other_paths_untouched() {
        assert_eq!(localize_href("/static/logo.png", "en", "fr"), None);
        assert_eq!(localize_href("https://example.com/en/x", "en", "fr"), None);
        assert_eq!(localize_href("/enterprise/about.html", "en", "fr"), None);
        assert_eq!(localize_href("#section", "en", "fr"), None);
    }
}
