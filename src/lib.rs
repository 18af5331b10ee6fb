pub mod config;
pub mod epub;
pub mod extractor;
pub mod record;

// === 核心API重新导出 ===

/// 元数据提取器（主要接口）
pub use extractor::Extractor;

/// 提取结果
pub use record::MetadataRecord;

/// 提取配置
pub use config::ExtractConfig;

/// 错误处理
pub use epub::{EpubError, Result};

// === 底层组件（高级用法） ===

/// EPUB读取器与容器组件
pub use epub::{Container, Epub, RootFile};

/// OPF组件与meta标签
pub use epub::{CustomMetaEntry, ItemKind, ManifestItem, MetadataEntry, MetadataTable, Opf};

// === 库信息 ===

/// 库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// === 便捷函数 ===

/// 使用默认配置提取元数据
///
/// 这是 `Extractor::default().extract` 的便捷包装函数，封面（如果有）写入当前目录。
///
/// # 示例
///
/// ```no_run
/// let record = ebook_extract::extract("book.epub")?;
/// println!("书名: {:?}", record.values("title"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn extract<P: AsRef<std::path::Path>>(path: P) -> Result<MetadataRecord> {
    Extractor::default().extract(path)
}
