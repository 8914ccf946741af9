//! 文档重写器
//!
//! 对单个 (文档, 语言) 执行完整的翻译重写：
//!
//! 1. 解析为 DOM 树
//! 2. 按文档序收集可翻译叶级元素（纯文本模式 / 换行模式）
//! 3. 逐个顺序解析译文（目录建键 → 缓存查询 → 翻译服务，写前用）
//! 4. 全部解析完成后统一回填替换
//! 5. 重写语言作用域链接
//! 6. 序列化
//!
//! 解析与替换严格先后分离，序列化时不可能存在未完成的解析。
//! 给定稳定的缓存状态，同一输入两次重写产生逐字节相同的输出。

use std::cell::RefCell;

use html5ever::interface::QualName;
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use tracing::{debug, warn};

use crate::html::dom::{html_to_dom, set_node_attr};
use crate::html::links::rewrite_locale_links;
use crate::html::serializer::serialize_document;
use crate::translation::cache::TranslationCache;
use crate::translation::catalog::StringCatalog;
use crate::translation::config::BuildConfig;
use crate::translation::error::TranslationResult;
use crate::translation::provider::TranslationProvider;

/// 文本提取模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionMode {
    /// 元素没有子元素，文本为其修剪后的文本内容
    Plain,
    /// 子元素只有换行标记，`<br>` 提取为 `\n`，回填时再展开
    LineBreaks,
}

/// 一个待翻译的叶级文本单元
struct TextUnit {
    node: Handle,
    text: String,
    mode: ExtractionMode,
}

/// 文档重写器
///
/// 借用一次构建的目录与缓存投影，同一实例按顺序处理
/// 多个 (文档, 语言) 对。
pub struct DocumentRewriter<'a> {
    config: &'a BuildConfig,
    catalog: &'a mut StringCatalog,
    cache: &'a mut TranslationCache,
    provider: &'a dyn TranslationProvider,
}

impl<'a> DocumentRewriter<'a> {
    pub fn new(
        config: &'a BuildConfig,
        catalog: &'a mut StringCatalog,
        cache: &'a mut TranslationCache,
        provider: &'a dyn TranslationProvider,
    ) -> Self {
        Self {
            config,
            catalog,
            cache,
            provider,
        }
    }

    /// 把源语言文档重写为目标语言文档
    pub async fn rewrite(&mut self, html: &[u8], locale: &str) -> TranslationResult<Vec<u8>> {
        let dom = html_to_dom(html, "utf-8");

        let mut units = Vec::new();
        collect_units(self.config, &dom.document, &mut units);
        debug!(locale, units = units.len(), "可翻译单元收集完成");

        // 逐单元顺序解析：缓存写入先于任何替换和序列化
        let mut resolved = Vec::with_capacity(units.len());
        for unit in &units {
            let key = self.catalog.ensure_key(&unit.text)?;
            let translated = self.resolve(&key, &unit.text, locale).await?;
            resolved.push((key, translated));
        }

        for (unit, (key, translated)) in units.iter().zip(resolved.iter()) {
            apply_unit(&dom, unit, key, translated);
        }

        rewrite_locale_links(&dom.document, &self.config.source_locale, locale);

        Ok(serialize_document(dom, "utf-8"))
    }

    /// 解析单个键在目标语言下的文本
    ///
    /// 源语言直接返回规范文本；缓存未命中时请求翻译服务并
    /// 先写缓存再使用；服务失败回退规范文本（绝不输出空片段）。
    async fn resolve(
        &mut self,
        key: &str,
        canonical: &str,
        locale: &str,
    ) -> TranslationResult<String> {
        if locale == self.config.source_locale {
            return Ok(canonical.to_string());
        }
        if let Some(hit) = self.cache.get(key, locale) {
            return Ok(hit.to_string());
        }
        self.cache.record_provider_call();
        match self.provider.translate(canonical, locale).await {
            Ok(translated) => {
                self.cache.put(key, locale, &translated)?;
                // 先写者胜出：以缓存落定的值为准
                Ok(self
                    .cache
                    .get(key, locale)
                    .map(str::to_string)
                    .unwrap_or(translated))
            }
            Err(err) => {
                self.cache.record_provider_failure();
                warn!(key, locale, error = %err, "翻译失败，回退源语言文本");
                Ok(canonical.to_string())
            }
        }
    }
}

/// 按文档序收集可翻译叶级单元
fn collect_units(config: &BuildConfig, node: &Handle, units: &mut Vec<TextUnit>) {
    match node.data {
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                collect_units(config, child, units);
            }
        }
        NodeData::Element { ref name, .. } => {
            if config.is_translatable_tag(name.local.as_ref()) {
                if let Some(unit) = extract_unit(node) {
                    // 叶级承载元素整体作为一个单元，不再下钻
                    units.push(unit);
                    return;
                }
            }
            for child in node.children.borrow().iter() {
                collect_units(config, child, units);
            }
        }
        _ => {}
    }
}

/// 提取元素的可翻译文本
///
/// 无子元素走纯文本模式；子元素全为 `<br>` 走换行模式，
/// 多行图注作为单个翻译单元保留。其他子元素意味着该元素
/// 不是叶级承载者，返回 `None` 由调用者继续下钻。
/// 提取结果修剪后为空同样返回 `None`。
fn extract_unit(node: &Handle) -> Option<TextUnit> {
    let children = node.children.borrow();
    let element_children: Vec<&Handle> = children
        .iter()
        .filter(|c| matches!(c.data, NodeData::Element { .. }))
        .collect();

    if element_children.is_empty() {
        let mut text = String::new();
        for child in children.iter() {
            if let NodeData::Text { ref contents } = child.data {
                text.push_str(&contents.borrow());
            }
        }
        let text = normalize_spaces(&text);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        return Some(TextUnit {
            node: node.clone(),
            text: text.to_string(),
            mode: ExtractionMode::Plain,
        });
    }

    let only_line_breaks = element_children
        .iter()
        .all(|c| matches!(&c.data, NodeData::Element { name, .. } if name.local.as_ref() == "br"));
    if !only_line_breaks {
        return None;
    }

    let mut text = String::new();
    for child in children.iter() {
        match child.data {
            NodeData::Text { ref contents } => {
                text.push_str(&normalize_spaces(&contents.borrow()))
            }
            NodeData::Element { .. } => text.push('\n'),
            _ => {}
        }
    }
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(TextUnit {
        node: node.clone(),
        text: text.to_string(),
        mode: ExtractionMode::LineBreaks,
    })
}

/// 不换行空格在提取阶段统一成普通空格
fn normalize_spaces(text: &str) -> String {
    text.replace('\u{a0}', " ")
}

/// 把解析好的译文回填到元素中
///
/// 元素内容整体替换；换行模式下把 `\n` 重新展开为 `<br>`。
/// 同时在元素上标注 `data-string-key`。
fn apply_unit(dom: &RcDom, unit: &TextUnit, key: &str, translated: &str) {
    set_node_attr(&unit.node, "data-string-key", Some(key.to_string()));

    let mut children = unit.node.children.borrow_mut();
    children.clear();
    match unit.mode {
        ExtractionMode::Plain => {
            children.push(text_node(translated));
        }
        ExtractionMode::LineBreaks => {
            for (i, segment) in translated.split('\n').enumerate() {
                if i > 0 {
                    children.push(create_element(
                        dom,
                        QualName::new(None, ns!(html), LocalName::from("br")),
                        vec![],
                    ));
                }
                let segment = segment.trim();
                if !segment.is_empty() {
                    children.push(text_node(segment));
                }
            }
        }
    }
}

fn text_node(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(text.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BuildConfig {
        BuildConfig::default()
    }

    fn first_unit(html: &str) -> Option<(String, ExtractionMode)> {
        let dom = html_to_dom(html.as_bytes(), "utf-8");
        let mut units = Vec::new();
        collect_units(&config(), &dom.document, &mut units);
        units.first().map(|u| (u.text.clone(), u.mode))
    }

    #[test]
    fn plain_mode_trims_text() {
        let unit = first_unit("<html><body><p>  Welcome   Home  </p></body></html>");
        let (text, mode) = unit.unwrap();
        assert_eq!(text, "Welcome   Home");
        assert_eq!(mode, ExtractionMode::Plain);
    }

    #[test]
    fn line_break_mode_joins_lines() {
        let unit = first_unit("<html><body><p>First line<br>Second line</p></body></html>");
        let (text, mode) = unit.unwrap();
        assert_eq!(text, "First line\nSecond line");
        assert_eq!(mode, ExtractionMode::LineBreaks);
    }

    #[test]
    fn nbsp_becomes_plain_space() {
        let unit = first_unit("<html><body><p>Line\u{a0}one<br>two</p></body></html>");
        let (text, _) = unit.unwrap();
        assert_eq!(text, "Line one\ntwo");
    }

    #[test]
    fn nested_elements_are_skipped_in_favor_of_leaves() {
        let dom = html_to_dom(
            b"<html><body><p>Intro <a href=\"/en/x.html\">link text</a></p></body></html>",
            "utf-8",
        );
        let mut units = Vec::new();
        collect_units(&config(), &dom.document, &mut units);
        // 外层 <p> 含非换行子元素被跳过，只收集叶级 <a>
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "link text");
    }

    #[test]
    fn empty_elements_are_skipped() {
        let dom = html_to_dom(b"<html><body><p>   </p><div></div></body></html>", "utf-8");
        let mut units = Vec::new();
        collect_units(&config(), &dom.document, &mut units);
        assert!(units.is_empty());
    }

    #[test]
    fn collects_in_document_order() {
        let dom = html_to_dom(
            b"<html><body><h1>Title</h1><p>Body</p><li>Item</li></body></html>",
            "utf-8",
        );
        let mut units = Vec::new();
        collect_units(&config(), &dom.document, &mut units);
        let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["Title", "Body", "Item"]);
    }
}
