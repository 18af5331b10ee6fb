//! OPF（Open Packaging Format）文件解析模块
//!
//! 此模块提供EPUB文件中OPF包文件的解析功能：按命名空间分组的元数据表和内容条目清单。

mod manifest;
mod metadata;
mod parser;

pub use manifest::{ItemKind, ManifestItem, resolve_href};
pub use metadata::{DC_NAMESPACE, FieldTable, MetadataEntry, MetadataTable, OPF_NAMESPACE};
pub use parser::Opf;
