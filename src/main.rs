//! polysite 命令行入口

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use polysite::translation::config::BuildConfig;
use polysite::translation::provider::HttpProvider;
use polysite::{build_site, BuildOptions, BuildSummary, TranslationResult};

#[derive(Parser, Debug)]
#[command(
    name = "polysite",
    version,
    about = "把单语言 HTML 内容树构建为多语言静态站点"
)]
struct Cli {
    /// 源树根目录（其下包含源语言子目录与资源子目录）
    #[arg(short, long, default_value = "src")]
    source: PathBuf,

    /// 输出根目录
    #[arg(short, long, default_value = "dist")]
    output: PathBuf,

    /// 持久化存储文件
    #[arg(long, default_value = "strings.redb")]
    store: PathBuf,

    /// 配置文件路径（缺省查找 polysite.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 覆盖语言列表，逗号分隔（首个须为源语言所在列表的一员）
    #[arg(short, long)]
    locales: Option<String>,

    /// 覆盖翻译接口地址
    #[arg(long)]
    api_url: Option<String>,

    /// 构建后把目录导出为输出根目录下的 strings.json
    #[arg(long)]
    export_catalog: bool,

    /// 输出更详细的日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match run(&cli).await {
        Ok(summary) if summary.failed.is_empty() => {}
        Ok(_) => process::exit(2),
        Err(err) => {
            error!(error = %err, "构建中止");
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> TranslationResult<BuildSummary> {
    let mut config = BuildConfig::load(cli.config.as_deref())?;
    if let Some(locales) = &cli.locales {
        config.locales = locales
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }

    let provider = HttpProvider::new(
        &config.api_url,
        &config.source_locale,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let options = BuildOptions {
        source_dir: cli.source.clone(),
        output_dir: cli.output.clone(),
        store_path: cli.store.clone(),
        export_catalog: cli.export_catalog,
    };

    build_site(&options, &config, &provider).await
}
