//! 元数据提取器
//!
//! 打开EPUB，依次收集：元数据表中的全部字段、OPF类内容条目里的 `<meta>` 标签、
//! ID为 `cover` 的封面条目。每一步都输出一行带图标的日志。

use crate::config::ExtractConfig;
use crate::epub::error::Result;
use crate::epub::markup::collect_meta_tags;
use crate::epub::opf::{ItemKind, ManifestItem};
use crate::epub::reader::Epub;
use crate::record::MetadataRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 从EPUB文件提取元数据的提取器
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// 提取元数据
    ///
    /// EPUB无法打开或解析时返回错误，不会产生部分记录。
    /// 没有自定义meta标签、没有封面都只记录警告。
    /// 如果存在封面条目，封面文件会在返回之前写入输出目录。
    pub fn extract<P: AsRef<Path>>(&self, epub_path: P) -> Result<MetadataRecord> {
        let epub_path = epub_path.as_ref();
        info!("📂 正在打开EPUB文件: {}", epub_path.display());

        let mut epub = Epub::new(epub_path)?;
        info!("✅ EPUB文件加载成功!");
        info!(
            "📖 EPUB版本: {}, 唯一标识: {}",
            epub.version(),
            epub.unique_identifier().unwrap_or("无")
        );

        let mut record = MetadataRecord::new();
        Self::collect_standard_metadata(&epub, &mut record);
        Self::collect_custom_meta(&mut epub, &mut record);

        info!("🖼️ 正在查找封面图片...");
        match self.find_cover(&mut epub) {
            Some(content) => {
                let file_name = self.cover_file_name(epub_path);
                fs::write(self.config.output_dir().join(&file_name), content)?;
                info!("✅ 封面图片已提取到 {}", file_name);
                record.set_cover_image(file_name);
            }
            None => warn!("⚠️ EPUB中没有找到封面图片"),
        }

        Ok(record)
    }

    /// 按命名空间、字段、值的顺序合并元数据表，命名空间不进入输出键
    fn collect_standard_metadata(epub: &Epub, record: &mut MetadataRecord) {
        info!("🧾 正在提取标准元数据 (Dublin Core)...");

        for (namespace, fields) in epub.metadata().namespaces() {
            info!("📚 发现元数据命名空间: {}", namespace);
            for (key, entries) in fields {
                for entry in entries {
                    info!("🔹   - {}: {}", key, entry.value);
                    if !entry.attributes.is_empty() {
                        debug!("      属性: {:?}", entry.attributes);
                    }
                    record.push_field(key, entry.value.clone());
                }
            }
        }
    }

    /// 扫描文件名像OPF的HTML内容条目，收集其中全部 `<meta>` 标签的属性
    fn collect_custom_meta(epub: &mut Epub, record: &mut MetadataRecord) {
        info!("🔍 正在查找内容中嵌入的 <meta> 标签...");

        let candidates: Vec<ManifestItem> = epub
            .items_of_kind(ItemKind::Document)
            .filter(|item| item.is_package_like())
            .cloned()
            .collect();

        for item in &candidates {
            info!("📄   - 正在解析OPF文件: {}", item.href);
            let content = match epub.item_content(item) {
                Ok(content) => content,
                Err(e) => {
                    warn!("⚠️ 无法读取 {}: {}", item.path, e);
                    continue;
                }
            };

            for entry in collect_meta_tags(&content) {
                info!("🧷     + Meta标签: {:?}", entry.attributes());
                record.push_custom_meta(entry);
            }
        }

        if record.custom_meta().is_empty() {
            warn!("⚠️ 没有找到自定义 <meta> 标签");
        }
    }

    /// 查找封面条目并读取其字节；条目不存在或读取失败都返回None
    fn find_cover(&self, epub: &mut Epub) -> Option<Vec<u8>> {
        let item = epub.item_with_id(&self.config.cover_id)?.clone();
        match epub.item_content(&item) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!("⚠️ 封面条目 {} 无法读取: {}", item.path, e);
                None
            }
        }
    }

    /// 封面文件名：输入文件名去掉末尾的 `.epub` 后追加封面后缀
    pub fn cover_file_name<P: AsRef<Path>>(&self, epub_path: P) -> String {
        let name = base_name(epub_path.as_ref());
        let stem = name.strip_suffix(".epub").unwrap_or(name.as_str());
        format!("{}{}", stem, self.config.cover_suffix)
    }

    /// 元数据文件名：输入文件名去掉扩展名后追加元数据后缀
    pub fn metadata_file_name<P: AsRef<Path>>(&self, epub_path: P) -> String {
        let stem = epub_path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}{}", stem, self.config.metadata_suffix)
    }

    /// 元数据JSON的路径：配置了输出目录时写入该目录，否则与输入文件放在一起
    pub fn metadata_path<P: AsRef<Path>>(&self, epub_path: P) -> PathBuf {
        let epub_path = epub_path.as_ref();
        let dir = match &self.config.output_dir {
            Some(dir) => dir.as_path(),
            None => epub_path.parent().unwrap_or_else(|| Path::new("")),
        };
        dir.join(self.metadata_file_name(epub_path))
    }

    /// 把记录写入元数据JSON文件，返回写出的路径
    pub fn write_metadata<P: AsRef<Path>>(&self, epub_path: P, record: &MetadataRecord) -> Result<PathBuf> {
        let output = self.metadata_path(epub_path);
        record.write_json(&output)?;
        Ok(output)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
