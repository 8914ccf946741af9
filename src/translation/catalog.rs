//! 字符串目录
//!
//! 键 → 规范文本的权威映射。派生出的候选键只是提议，
//! 目录负责裁决：同一文本复用已有键，不同文本撞上同一
//! 候选键时用内容哈希后缀消歧，绝不静默合并。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::translation::error::TranslationResult;
use crate::translation::keys::derive_key;
use crate::translation::store::{LocaleStore, StringInsert};

/// 运行期字符串目录
///
/// 持久化存储之上的读穿投影，作用域限定为一次构建。
/// 写入遵循"先落表、再记住"，投影对自己写过的键永不过期。
pub struct StringCatalog {
    store: Arc<LocaleStore>,
    key_by_text: HashMap<String, String>,
    text_by_key: HashMap<String, String>,
}

impl StringCatalog {
    pub fn new(store: Arc<LocaleStore>) -> Self {
        Self {
            store,
            key_by_text: HashMap::new(),
            text_by_key: HashMap::new(),
        }
    }

    /// 构建开始时一次性加载全部已知键
    ///
    /// 返回加载的记录数。之后运行内的查找不再访问存储。
    pub fn load_all_keys(&mut self) -> TranslationResult<usize> {
        let entries = self.store.load_strings()?;
        let count = entries.len();
        for (key, text) in entries {
            self.key_by_text.insert(text.clone(), key.clone());
            self.text_by_key.insert(key, text);
        }
        debug!(count, "字符串目录已加载");
        Ok(count)
    }

    /// 按规范文本精确查找已有键
    pub fn find_key_by_text(&self, text: &str) -> Option<&str> {
        self.key_by_text.get(text.trim()).map(String::as_str)
    }

    /// 按键查找规范文本
    pub fn canonical_text(&self, key: &str) -> Option<&str> {
        self.text_by_key.get(key).map(String::as_str)
    }

    /// 已知键的数量
    pub fn len(&self) -> usize {
        self.text_by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text_by_key.is_empty()
    }

    /// 排序后的全部键，供批量预填充遍历
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.text_by_key.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 排序后的 (键, 规范文本)，供目录导出
    pub fn sorted_entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .text_by_key
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }

    /// 确保文本拥有一个键
    ///
    /// 已见过的文本直接复用原键；新文本依次尝试候选键：
    /// 派生的短键、短键加8位哈希后缀、完整内容哈希。
    /// 候选键被其他文本占用视为碰撞，记入日志后换下一个候选。
    /// 存储层的占用（并发写入者先到）同样按此规则处理：
    /// 同文本则采纳对方的键，异文本则继续消歧。
    pub fn ensure_key(&mut self, text: &str) -> TranslationResult<String> {
        let text = text.trim();
        if let Some(key) = self.key_by_text.get(text) {
            return Ok(key.clone());
        }

        let slug = derive_key(text);
        let digest = blake3::hash(text.as_bytes()).to_hex().to_string();
        let candidates = [
            slug.clone(),
            format!("{}-{}", slug, &digest[..8]),
            digest.clone(),
        ];

        for candidate in &candidates {
            match self.text_by_key.get(candidate) {
                Some(bound) if bound != text => {
                    warn!(
                        key = %candidate,
                        existing = %bound,
                        incoming = %text,
                        "键派生碰撞，改用哈希后缀"
                    );
                    continue;
                }
                Some(_) => return Ok(candidate.clone()),
                None => {}
            }

            match self.store.insert_string_if_absent(candidate, text)? {
                StringInsert::Inserted => {
                    self.remember(candidate.clone(), text.to_string());
                    return Ok(candidate.clone());
                }
                StringInsert::Existing(bound) if bound == text => {
                    // 另一写入者已为同一文本建键，采纳之
                    self.remember(candidate.clone(), text.to_string());
                    return Ok(candidate.clone());
                }
                StringInsert::Existing(bound) => {
                    warn!(
                        key = %candidate,
                        existing = %bound,
                        incoming = %text,
                        "存储中的键已被占用，继续消歧"
                    );
                    self.remember(candidate.clone(), bound);
                }
            }
        }

        // 完整 blake3 哈希对每个文本唯一，走到这里说明存储已损坏
        Err(crate::translation::error::TranslationError::Store(format!(
            "无法为文本分配键: {text:?}"
        )))
    }

    fn remember(&mut self, key: String, text: String) {
        self.key_by_text.insert(text.clone(), key.clone());
        self.text_by_key.insert(key, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> (tempfile::TempDir, StringCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocaleStore::open(&dir.path().join("strings.redb")).unwrap();
        (dir, StringCatalog::new(Arc::new(store)))
    }

    #[test]
    fn identical_texts_share_one_key() {
        let (_dir, mut catalog) = catalog();
        // 去除首尾空白后相同的文本是同一条规范文本
        let a = catalog.ensure_key("  Welcome Home  ").unwrap();
        let b = catalog.ensure_key("Welcome Home").unwrap();
        assert_eq!(a, "Welcome_Home");
        assert_eq!(a, b);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn inner_whitespace_distinguishes_canonical_texts() {
        let (_dir, mut catalog) = catalog();
        // 内部空白不折叠：两条文本撞上同一候选键，第二条获得后缀键
        let a = catalog.ensure_key("Welcome   Home").unwrap();
        let b = catalog.ensure_key("Welcome Home").unwrap();
        assert_eq!(a, "Welcome_Home");
        assert_ne!(a, b);
        assert!(b.starts_with("Welcome_Home-"));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn colliding_texts_get_distinct_keys() {
        let (_dir, mut catalog) = catalog();
        let cats = "This is a very long caption about cats";
        let dogs = "This is a very long caption about dogs";
        let key_cats = catalog.ensure_key(cats).unwrap();
        let key_dogs = catalog.ensure_key(dogs).unwrap();
        assert_ne!(key_cats, key_dogs);
        assert!(key_dogs.starts_with(&key_cats));
        assert_eq!(catalog.canonical_text(&key_cats), Some(cats));
        assert_eq!(catalog.canonical_text(&key_dogs), Some(dogs));
    }

    #[test]
    fn adopts_key_written_by_another_writer() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocaleStore::open(&dir.path().join("strings.redb")).unwrap());
        // 另一写入者先落表；本目录尚未见过该文本
        store
            .insert_string_if_absent("Welcome_Home", "Welcome Home")
            .unwrap();
        let mut catalog = StringCatalog::new(store);
        let key = catalog.ensure_key("Welcome Home").unwrap();
        assert_eq!(key, "Welcome_Home");
    }

    #[test]
    fn hydration_restores_bindings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strings.redb");
        {
            let store = Arc::new(LocaleStore::open(&path).unwrap());
            let mut catalog = StringCatalog::new(store);
            catalog.ensure_key("Products and Services").unwrap();
        }
        let store = Arc::new(LocaleStore::open(&path).unwrap());
        let mut catalog = StringCatalog::new(store);
        assert_eq!(catalog.load_all_keys().unwrap(), 1);
        assert_eq!(
            catalog.find_key_by_text("Products and Services"),
            Some("Products_and_Service")
        );
        // 再次 ensure 不产生新记录
        catalog.ensure_key("Products and Services").unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
