//! 翻译缓存
//!
//! (键, 语言) → 译文的读穿投影，持久化在同一 redb 存储中。
//! 写入是幂等的先写者胜出：重复构建绝不改写已接受的译文，
//! 即使外部翻译服务后来返回了不同的结果。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::translation::catalog::StringCatalog;
use crate::translation::error::TranslationResult;
use crate::translation::provider::TranslationProvider;
use crate::translation::store::LocaleStore;

/// 缓存统计信息
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub provider_calls: u64,
    pub provider_failures: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 运行期翻译缓存
pub struct TranslationCache {
    store: Arc<LocaleStore>,
    // 键 → 语言 → 译文
    map: HashMap<String, HashMap<String, String>>,
    stats: CacheStats,
}

impl TranslationCache {
    pub fn new(store: Arc<LocaleStore>) -> Self {
        Self {
            store,
            map: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// 构建开始时一次性加载全部译文
    pub fn load_all(&mut self) -> TranslationResult<usize> {
        let entries = self.store.load_translations()?;
        let count = entries.len();
        for (key, locale, text) in entries {
            self.map.entry(key).or_default().insert(locale, text);
        }
        debug!(count, "翻译缓存已加载");
        Ok(count)
    }

    /// 查询 (键, 语言) 的译文
    pub fn get(&mut self, key: &str, locale: &str) -> Option<&str> {
        let found = self
            .map
            .get(key)
            .and_then(|locales| locales.get(locale))
            .map(String::as_str);
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    /// 幂等写入译文
    ///
    /// 已存在的 (键, 语言) 保持原值不动；返回值指示本次写入是否生效。
    pub fn put(&mut self, key: &str, locale: &str, text: &str) -> TranslationResult<bool> {
        if let Some(existing) = self.map.get(key).and_then(|l| l.get(locale)) {
            debug!(key, locale, existing = %existing, "译文已存在，写入被忽略");
            return Ok(false);
        }
        let stored = match self.store.insert_translation_if_absent(key, locale, text)? {
            // 存储里已有别的写入者留下的译文，采纳之
            Some(existing) => existing,
            None => text.to_string(),
        };
        let fresh = stored == text;
        self.map
            .entry(key.to_string())
            .or_default()
            .insert(locale.to_string(), stored);
        Ok(fresh)
    }

    /// 批量预填充缺失的 (键, 语言) 对
    ///
    /// 对目录中每个已知键和每个目标语言，缺失的译文逐个请求
    /// 翻译服务并写入。单对失败只记日志并跳过，不中断整个预填充。
    pub async fn fill_missing(
        &mut self,
        catalog: &StringCatalog,
        locales: &[String],
        source_locale: &str,
        provider: &dyn TranslationProvider,
    ) -> TranslationResult<usize> {
        let mut filled = 0;
        for key in catalog.sorted_keys() {
            let Some(text) = catalog.canonical_text(&key) else {
                continue;
            };
            let text = text.to_string();
            for locale in locales {
                if locale == source_locale {
                    continue;
                }
                if self.get(&key, locale).is_some() {
                    continue;
                }
                self.stats.provider_calls += 1;
                match provider.translate(&text, locale).await {
                    Ok(translated) => {
                        self.put(&key, locale, &translated)?;
                        filled += 1;
                    }
                    Err(err) => {
                        self.stats.provider_failures += 1;
                        warn!(key = %key, locale = %locale, error = %err, "预填充失败，留空待重试");
                    }
                }
            }
        }
        if filled > 0 {
            info!(filled, "翻译缓存预填充完成");
        }
        Ok(filled)
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn record_provider_call(&mut self) {
        self.stats.provider_calls += 1;
    }

    pub fn record_provider_failure(&mut self) {
        self.stats.provider_failures += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (tempfile::TempDir, TranslationCache) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocaleStore::open(&dir.path().join("strings.redb")).unwrap();
        (dir, TranslationCache::new(Arc::new(store)))
    }

    #[test]
    fn put_is_first_write_wins() {
        let (_dir, mut cache) = cache();
        assert!(cache.put("Welcome_Home", "es", "Bienvenido a Casa").unwrap());
        assert!(!cache.put("Welcome_Home", "es", "Otra cosa").unwrap());
        assert_eq!(cache.get("Welcome_Home", "es"), Some("Bienvenido a Casa"));
    }

    #[test]
    fn adopts_translation_written_by_another_writer() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocaleStore::open(&dir.path().join("strings.redb")).unwrap());
        store
            .insert_translation_if_absent("Welcome_Home", "fr", "Bienvenue")
            .unwrap();
        let mut cache = TranslationCache::new(store);
        // 内存投影未命中，但存储已有记录：写入让位并采纳存量值
        assert!(!cache.put("Welcome_Home", "fr", "Autre chose").unwrap());
        assert_eq!(cache.get("Welcome_Home", "fr"), Some("Bienvenue"));
    }

    #[test]
    fn hydration_restores_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strings.redb");
        {
            let store = Arc::new(LocaleStore::open(&path).unwrap());
            let mut cache = TranslationCache::new(store);
            cache.put("Hello", "de", "Hallo").unwrap();
        }
        let store = Arc::new(LocaleStore::open(&path).unwrap());
        let mut cache = TranslationCache::new(store);
        assert_eq!(cache.load_all().unwrap(), 1);
        assert_eq!(cache.get("Hello", "de"), Some("Hallo"));
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let (_dir, mut cache) = cache();
        assert!(cache.get("nope", "fr").is_none());
        cache.put("k", "fr", "v").unwrap();
        assert!(cache.get("k", "fr").is_some());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
