use clap::Parser;
use clap::error::ErrorKind;
use ebook_extract::{EpubError, ExtractConfig, Extractor, Result};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 📚 ebook-extract - EPUB元数据提取工具
#[derive(Parser)]
#[command(name = "ebook-extract")]
#[command(about = "从EPUB文件中提取元数据（Dublin Core、自定义meta标签、封面）并保存为JSON")]
#[command(version)]
struct Args {
    /// EPUB文件路径
    #[arg(help = "要提取元数据的EPUB文件路径")]
    epub_file: PathBuf,

    /// 配置文件路径
    #[arg(short, long, value_name = "FILE", help = "YAML配置文件路径（可选）")]
    config: Option<PathBuf>,
}

fn main() {
    init_logging();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            error!("❌ 用法: ebook-extract <EPUB文件>");
            let _ = e.print();
            process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        error!("❌ {}", e);
        process::exit(1);
    }
}

/// 日志输出到标准输出，带时间戳；默认级别为info，可用 RUST_LOG 调整
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ExtractConfig::from_file(path)?,
        None => ExtractConfig::default(),
    };

    if !args.epub_file.exists() {
        return Err(EpubError::FileNotFound(args.epub_file.clone()));
    }

    if let Some(dir) = &config.output_dir {
        fs::create_dir_all(dir)?;
    }

    let extractor = Extractor::new(config);
    let record = extractor.extract(&args.epub_file)?;
    let output = extractor.write_metadata(&args.epub_file, &record)?;

    info!("✅ 元数据已保存到 {}", output.display());
    Ok(())
}
