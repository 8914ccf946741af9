//! 构建编排
//!
//! 把单语言源树变成多语言站点：对每个配置语言，把源语言子树
//! 镜像为一个以语言命名的输出子树，HTML 文档经文档重写器翻译，
//! 其余文件按原样拷贝；资源子目录在输出根目录只拷贝一次，
//! 源树根部的 HTML 文档不翻译直接拷贝。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::translation::cache::{CacheStats, TranslationCache};
use crate::translation::catalog::StringCatalog;
use crate::translation::config::BuildConfig;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::provider::TranslationProvider;
use crate::translation::rewriter::DocumentRewriter;
use crate::translation::store::LocaleStore;

/// 单次构建的外部参数
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// 源树根目录（其下包含源语言子目录与资源子目录）
    pub source_dir: PathBuf,
    /// 输出根目录
    pub output_dir: PathBuf,
    /// 持久化存储文件路径
    pub store_path: PathBuf,
    /// 构建结束后把目录导出为输出根目录下的 strings.json
    pub export_catalog: bool,
}

/// 构建结果汇总
#[derive(Debug, Default)]
pub struct BuildSummary {
    /// 成功重写的 (文档, 语言) 对数量
    pub documents_rewritten: usize,
    /// 按原样拷贝的文件数量（含资源与根部 HTML）
    pub files_copied: usize,
    /// 处理的语言数量
    pub locales_built: usize,
    /// 失败的文档路径及原因，构建结束时统一报告
    pub failed: Vec<(PathBuf, String)>,
    /// 缓存与翻译服务统计
    pub cache_stats: CacheStats,
}

/// 源语言子树里的一个条目
enum TreeEntry {
    Dir(PathBuf),
    Document(PathBuf),
    Other(PathBuf),
}

/// 执行完整的多语言构建
///
/// 存储打开失败对整个构建致命；单个文档的失败只记入
/// [`BuildSummary::failed`]，其余文档继续处理。
pub async fn build_site(
    options: &BuildOptions,
    config: &BuildConfig,
    provider: &dyn TranslationProvider,
) -> TranslationResult<BuildSummary> {
    config.validate()?;

    let locale_root = options.source_dir.join(&config.source_locale);
    if !locale_root.is_dir() {
        return Err(TranslationError::Config(format!(
            "源语言子目录不存在: {}",
            locale_root.display()
        )));
    }

    let store = Arc::new(LocaleStore::open(&options.store_path)?);
    let mut catalog = StringCatalog::new(Arc::clone(&store));
    let mut cache = TranslationCache::new(Arc::clone(&store));
    let known_keys = catalog.load_all_keys()?;
    let known_translations = cache.load_all()?;
    info!(known_keys, known_translations, "运行期投影已加载");

    // 预填充：让逐文档阶段对所有已知键都能命中缓存。
    // 此后首次出现的新文本仍由逐文档解析兜底。
    cache
        .fill_missing(&catalog, &config.locales, &config.source_locale, provider)
        .await?;

    let entries = collect_tree(&locale_root)?;
    let mut summary = BuildSummary::default();

    let mut rewriter = DocumentRewriter::new(config, &mut catalog, &mut cache, provider);
    for locale in &config.locales {
        let locale_out = options.output_dir.join(locale);
        fs::create_dir_all(&locale_out)?;
        info!(locale = %locale, "开始构建语言子树");

        for entry in &entries {
            match entry {
                TreeEntry::Dir(rel) => {
                    fs::create_dir_all(locale_out.join(rel))?;
                }
                TreeEntry::Other(rel) => {
                    copy_file(&locale_root.join(rel), &locale_out.join(rel))?;
                    summary.files_copied += 1;
                }
                TreeEntry::Document(rel) => {
                    let source_path = locale_root.join(rel);
                    match rewrite_one(&mut rewriter, &source_path, locale).await {
                        Ok(output) => {
                            let out_path = locale_out.join(rel);
                            if let Some(parent) = out_path.parent() {
                                fs::create_dir_all(parent)?;
                            }
                            fs::write(&out_path, output)?;
                            summary.documents_rewritten += 1;
                        }
                        Err(err) if err.is_fatal() => return Err(err),
                        Err(err) => {
                            warn!(path = %source_path.display(), error = %err, "文档处理失败，继续构建");
                            summary.failed.push((source_path, err.to_string()));
                        }
                    }
                }
            }
        }
        summary.locales_built += 1;
    }
    summary.cache_stats = cache.stats().clone();

    copy_assets(options, config, &mut summary)?;
    copy_root_documents(options, &mut summary)?;

    if options.export_catalog {
        export_catalog(&catalog, &options.output_dir)?;
    }

    report(&summary);
    Ok(summary)
}

async fn rewrite_one(
    rewriter: &mut DocumentRewriter<'_>,
    path: &Path,
    locale: &str,
) -> TranslationResult<Vec<u8>> {
    let bytes = fs::read(path).map_err(|e| TranslationError::Document {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    rewriter.rewrite(&bytes, locale).await
}

/// 一次性收集源语言子树的全部条目（相对路径，目录在先）
fn collect_tree(root: &Path) -> TranslationResult<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut children: Vec<PathBuf> = fs::read_dir(&dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .collect();
        children.sort();
        for path in children {
            let rel = path
                .strip_prefix(root)
                .map_err(|e| TranslationError::Config(e.to_string()))?
                .to_path_buf();
            if path.is_dir() {
                entries.push(TreeEntry::Dir(rel));
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "html") {
                entries.push(TreeEntry::Document(rel));
            } else {
                entries.push(TreeEntry::Other(rel));
            }
        }
    }
    Ok(entries)
}

/// 资源子目录在输出根目录只拷贝一次（不按语言重复）
fn copy_assets(
    options: &BuildOptions,
    config: &BuildConfig,
    summary: &mut BuildSummary,
) -> TranslationResult<()> {
    for asset_dir in &config.asset_dirs {
        let source = options.source_dir.join(asset_dir);
        if !source.is_dir() {
            continue;
        }
        let copied = copy_dir_recursive(&source, &options.output_dir.join(asset_dir))?;
        debug!(dir = %asset_dir, copied, "资源目录已拷贝");
        summary.files_copied += copied;
    }
    Ok(())
}

/// 源树根部的 HTML 文档原样拷贝，不参与翻译
fn copy_root_documents(
    options: &BuildOptions,
    summary: &mut BuildSummary,
) -> TranslationResult<()> {
    for entry in fs::read_dir(&options.source_dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            if let Some(name) = path.file_name() {
                copy_file(&path, &options.output_dir.join(name))?;
                summary.files_copied += 1;
            }
        }
    }
    Ok(())
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> TranslationResult<usize> {
    fs::create_dir_all(dest)?;
    let mut copied = 0;
    for entry in fs::read_dir(source)? {
        let path = entry?.path();
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = dest.join(name);
        if path.is_dir() {
            copied += copy_dir_recursive(&path, &target)?;
        } else {
            copy_file(&path, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn copy_file(source: &Path, dest: &Path) -> TranslationResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest)?;
    Ok(())
}

/// 把目录导出为输出根目录下的 strings.json（键排序，稳定输出）
fn export_catalog(catalog: &StringCatalog, output_dir: &Path) -> TranslationResult<()> {
    let entries: std::collections::BTreeMap<String, String> =
        catalog.sorted_entries().into_iter().collect();
    let json = serde_json::to_string_pretty(&entries)
        .map_err(|e| TranslationError::Config(e.to_string()))?;
    fs::write(output_dir.join("strings.json"), json)?;
    Ok(())
}

fn report(summary: &BuildSummary) {
    info!(
        locales = summary.locales_built,
        documents = summary.documents_rewritten,
        copied = summary.files_copied,
        cache_hits = summary.cache_stats.hits,
        provider_calls = summary.cache_stats.provider_calls,
        provider_failures = summary.cache_stats.provider_failures,
        "构建完成"
    );
    for (path, reason) in &summary.failed {
        error!(path = %path.display(), reason = %reason, "文档构建失败");
    }
}
