use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> RcDom {
    let s: String;

    if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        s = string.to_string();
    } else {
        s = String::from_utf8_lossy(data).to_string();
    }

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
        .unwrap()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 设置节点属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::{namespace_url, ns, LocalName};

    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.clone() {
                    let _ = &attrs_mut[i].value.clear();
                    let _ = &attrs_mut[i].value.push_slice(attr_value.as_str());
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            // Add new attribute (since originally the target node didn't have it)
            if let Some(attr_value) = attr_value.clone() {
                let name = LocalName::from(attr_name);

                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_reads_attributes() {
        let dom = html_to_dom(
            b"<html><body><a href=\"/en/about.html\">About</a></body></html>",
            "utf-8",
        );
        let html = dom.document.children.borrow()[0].clone();
        let body = html.children.borrow()[1].clone();
        let anchor = body.children.borrow()[0].clone();
        assert_eq!(get_node_name(&anchor), Some("a"));
        assert_eq!(
            get_node_attr(&anchor, "href"),
            Some("/en/about.html".to_string())
        );
    }

    #[test]
    fn set_node_attr_adds_and_replaces() {
        let dom = html_to_dom(b"<html><body><p>Hi</p></body></html>", "utf-8");
        let html = dom.document.children.borrow()[0].clone();
        let body = html.children.borrow()[1].clone();
        let p = body.children.borrow()[0].clone();

        set_node_attr(&p, "data-string-key", Some("Hi".to_string()));
        assert_eq!(get_node_attr(&p, "data-string-key"), Some("Hi".to_string()));

        set_node_attr(&p, "data-string-key", Some("Hello".to_string()));
        assert_eq!(
            get_node_attr(&p, "data-string-key"),
            Some("Hello".to_string())
        );

        set_node_attr(&p, "data-string-key", None);
        assert_eq!(get_node_attr(&p, "data-string-key"), None);
    }
}
