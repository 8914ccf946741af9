// 集成测试公共工具
//
// 两个集成套件通过 include! 共享本文件，各套件只使用其中一部分

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use polysite::translation::cache::TranslationCache;
use polysite::translation::catalog::StringCatalog;
use polysite::translation::config::BuildConfig;
use polysite::translation::error::TranslationResult;
use polysite::translation::provider::TranslationProvider;
use polysite::translation::store::LocaleStore;

#[allow(dead_code)]
/// 三语言测试配置
pub fn test_config() -> BuildConfig {
    BuildConfig {
        locales: vec!["en".to_string(), "es".to_string(), "fr".to_string()],
        ..BuildConfig::default()
    }
}

#[allow(dead_code)]
/// 在临时目录中打开一套完整的运行期投影
pub fn open_projections(dir: &Path) -> (StringCatalog, TranslationCache) {
    let store = Arc::new(LocaleStore::open(&dir.join("strings.redb")).unwrap());
    let mut catalog = StringCatalog::new(Arc::clone(&store));
    let mut cache = TranslationCache::new(store);
    catalog.load_all_keys().unwrap();
    cache.load_all().unwrap();
    (catalog, cache)
}

#[allow(dead_code)]
/// 构造一棵最小的源树：源语言子目录、嵌套文档、资源目录、根部 HTML
pub fn write_source_tree(root: &Path) {
    fs::create_dir_all(root.join("en/docs")).unwrap();
    fs::write(
        root.join("en/index.html"),
        "<html><head><title>Site</title></head><body>\
         <h1>Welcome Home</h1>\
         <p>Our products are listed below.</p>\
         <a href=\"/en/products.html\">Products</a>\
         </body></html>",
    )
    .unwrap();
    fs::write(
        root.join("en/docs/about.html"),
        "<html><body><p>About the team</p></body></html>",
    )
    .unwrap();
    fs::create_dir_all(root.join("styles")).unwrap();
    fs::write(root.join("styles/site.css"), "body { margin: 0; }").unwrap();
    fs::create_dir_all(root.join("static")).unwrap();
    fs::write(root.join("static/logo.png"), [0x89u8, 0x50, 0x4e, 0x47]).unwrap();
    fs::write(
        root.join("landing.html"),
        "<html><body><p>Untranslated landing</p></body></html>",
    )
    .unwrap();
}

#[allow(dead_code)]
/// 每次调用返回同一固定译文的服务，用于验证缓存单调性
pub struct AlteredProvider;

#[async_trait]
impl TranslationProvider for AlteredProvider {
    async fn translate(&self, _text: &str, _target_locale: &str) -> TranslationResult<String> {
        Ok("ALTERED".to_string())
    }
}
