pub mod container;
pub mod error;
pub mod markup;
pub mod opf;
pub mod reader;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出容器相关
pub use container::{Container, RootFile};

// 重新导出EPUB读取器
pub use reader::Epub;

// 重新导出meta标签提取
pub use markup::{CustomMetaEntry, collect_meta_tags};

// 重新导出OPF相关
pub use opf::{ItemKind, ManifestItem, MetadataEntry, MetadataTable, Opf};
