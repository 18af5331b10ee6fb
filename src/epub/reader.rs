use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::epub::container::Container;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{ItemKind, ManifestItem, MetadataTable, Opf};

const MIMETYPE_PATH: &str = "mimetype";
const EXPECTED_MIMETYPE: &str = "application/epub+zip";
const CONTAINER_PATH: &str = "META-INF/container.xml";

/// 一个已打开的EPUB文件
///
/// 打开时即完成验证和OPF解析，之后只按需读取内容条目的字节。
pub struct Epub {
    archive: ZipArchive<File>,
    opf_path: String,
    opf: Opf,
}

impl Epub {
    /// 从文件路径打开EPUB
    ///
    /// 依次执行：打开ZIP压缩包、验证mimetype、解析container.xml、解析OPF文件。
    /// 任意一步失败都返回错误，不会得到部分解析的结果。
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Epub> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        Self::validate(&mut archive)?;

        let container_content = read_required(&mut archive, CONTAINER_PATH)?;
        let container = Container::parse_xml(&container_content)?;
        let opf_path = container
            .opf_path()
            .ok_or_else(|| {
                EpubError::ContainerParseError("container.xml中没有找到有效的rootfile".to_string())
            })?
            .to_string();

        let opf_dir = opf_path.rfind('/').map(|pos| &opf_path[..pos]).unwrap_or("");
        let opf_content = read_required(&mut archive, &opf_path)?;
        let opf = Opf::parse_xml(&opf_content, opf_dir)?;

        tracing::debug!(
            "📦 OPF: {} (版本 {}, {} 个清单项)",
            opf_path,
            opf.version,
            opf.manifest.len()
        );

        Ok(Epub {
            archive,
            opf_path,
            opf,
        })
    }

    /// 验证mimetype文件存在且内容为 "application/epub+zip"
    fn validate(archive: &mut ZipArchive<File>) -> Result<()> {
        let mut file = match archive.by_name(MIMETYPE_PATH) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(EpubError::MissingMimetype),
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        file.read_to_string(&mut content)?;

        let content = content.trim();
        if content != EXPECTED_MIMETYPE {
            return Err(EpubError::InvalidMimetype {
                expected: EXPECTED_MIMETYPE.to_string(),
                found: content.to_string(),
            });
        }

        tracing::debug!("✅ EPUB验证成功: mimetype文件正确");
        Ok(())
    }

    /// OPF文件在压缩包中的路径
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    /// EPUB版本（OPF package元素的version属性）
    pub fn version(&self) -> &str {
        &self.opf.version
    }

    /// package元素的unique-identifier属性
    pub fn unique_identifier(&self) -> Option<&str> {
        self.opf.unique_identifier.as_deref()
    }

    /// 元数据表
    pub fn metadata(&self) -> &MetadataTable {
        &self.opf.metadata
    }

    /// 全部内容条目，按清单顺序
    pub fn items(&self) -> &[ManifestItem] {
        &self.opf.manifest
    }

    /// 指定类型的内容条目，按清单顺序
    pub fn items_of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &ManifestItem> {
        self.opf.items_of_kind(kind)
    }

    /// 根据ID查找内容条目
    pub fn item_with_id(&self, id: &str) -> Option<&ManifestItem> {
        self.opf.item_with_id(id)
    }

    /// 读取内容条目的原始字节
    pub fn item_content(&mut self, item: &ManifestItem) -> Result<Vec<u8>> {
        self.extract_binary_file(&item.path)
    }

    /// 提取指定文件的二进制内容
    ///
    /// # 参数
    /// * `filename` - 压缩包内的完整路径
    pub fn extract_binary_file(&mut self, filename: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(filename)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// 读取结构上必需的文本文件，缺失时视为无效的EPUB
fn read_required(archive: &mut ZipArchive<File>, name: &str) -> Result<String> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(EpubError::InvalidEpub(format!("缺少文件: {}", name)));
        }
        Err(e) => return Err(e.into()),
    };

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let content = String::from_utf8_lossy(&buffer);
    Ok(content.strip_prefix('\u{feff}').unwrap_or(&*content).to_string())
}
