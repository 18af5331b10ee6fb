//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）文件的XML解析功能。
//! 解析结果包含按命名空间分组的元数据表和按文档顺序排列的清单。

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{
    manifest::{ItemKind, ManifestItem},
    metadata::{DC_NAMESPACE, MetadataEntry, MetadataTable, OPF_NAMESPACE},
};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// OPF文件解析结果
#[derive(Debug, Clone)]
pub struct Opf {
    /// EPUB版本
    pub version: String,
    /// package元素的unique-identifier属性
    pub unique_identifier: Option<String>,
    /// 元数据表
    pub metadata: MetadataTable,
    /// 清单项，保持文档顺序
    pub manifest: Vec<ManifestItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Metadata,
    Manifest,
}

/// 正在读取中的元数据元素
struct PendingEntry {
    namespace: String,
    key: String,
    /// meta name/content 形式的值直接来自属性
    fixed_value: Option<String>,
    text: String,
    attributes: IndexMap<String, String>,
    depth: usize,
}

impl PendingEntry {
    /// 根据元数据区中的开始标签创建条目；无法归入任何字段的meta返回None
    fn start(namespace: String, e: &BytesStart, depth: usize) -> Result<Option<Self>> {
        let attributes = collect_attributes(e)?;
        let local_name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        let (key, fixed_value) = if local_name == "meta" {
            if let Some(name) = attributes.get("name") {
                (name.clone(), attributes.get("content").cloned())
            } else if let Some(property) = attributes.get("property") {
                (property.clone(), None)
            } else {
                return Ok(None);
            }
        } else {
            (local_name, None)
        };

        Ok(Some(Self {
            namespace,
            key,
            fixed_value,
            text: String::new(),
            attributes,
            depth,
        }))
    }

    fn finish(self, metadata: &mut MetadataTable) {
        let value = match self.fixed_value {
            Some(value) => value,
            None => self.text.trim().to_string(),
        };
        metadata.add(
            &self.namespace,
            &self.key,
            MetadataEntry::with_attributes(value, self.attributes),
        );
    }
}

impl Opf {
    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    /// * `opf_dir` - OPF文件在压缩包中的目录，用于解析清单项的href
    ///
    /// # 返回值
    /// * `Result<Opf, EpubError>` - 解析后的OPF信息，XML错误统一转换为 `OpfParseError`
    pub fn parse_xml(xml_content: &str, opf_dir: &str) -> Result<Opf> {
        Self::parse_events(xml_content, opf_dir).map_err(|e| match e {
            EpubError::XmlError(xml_err) => EpubError::OpfParseError(format!("XML解析错误: {}", xml_err)),
            other => other,
        })
    }

    fn parse_events(xml_content: &str, opf_dir: &str) -> Result<Opf> {
        let mut reader = NsReader::from_str(xml_content);
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut found_package = false;
        let mut version = String::new();
        let mut unique_identifier = None;
        let mut metadata = MetadataTable::new();
        let mut manifest = Vec::new();

        let mut buf = Vec::new();
        let mut section = Section::Outside;
        let mut pending: Option<PendingEntry> = None;
        let mut depth = 0usize;

        loop {
            let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
            let namespace = namespace_uri(&resolved);

            match event {
                Event::Start(ref e) => {
                    depth += 1;
                    let local_name = e.local_name();

                    match (section, local_name.as_ref()) {
                        (Section::Outside, b"package") if depth == 1 => {
                            found_package = true;
                            let attributes = collect_attributes(e)?;
                            version = attributes.get("version").cloned().unwrap_or_default();
                            unique_identifier = attributes.get("unique-identifier").cloned();
                        }
                        // 只认package的直接子元素，collection等内部的metadata不算
                        (Section::Outside, b"metadata") if depth == 2 => section = Section::Metadata,
                        (Section::Outside, b"manifest") if depth == 2 => section = Section::Manifest,
                        // OPF 2.0 的旧式包装元素，其子元素仍然是元数据
                        (Section::Metadata, b"dc-metadata" | b"x-metadata") if pending.is_none() => {}
                        (Section::Metadata, _) if pending.is_none() => {
                            pending = PendingEntry::start(namespace, e, depth)?;
                        }
                        (Section::Manifest, b"item") => {
                            if let Some(item) = Self::parse_manifest_item(e, opf_dir)? {
                                manifest.push(item);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(ref e) => {
                    if let Some(entry) = pending.as_mut() {
                        entry.text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(ref e) => {
                    if let Some(entry) = pending.as_mut() {
                        entry.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => {
                    if let Some(entry) = pending.take_if(|entry| entry.depth == depth) {
                        entry.finish(&mut metadata);
                    }

                    match (section, e.local_name().as_ref()) {
                        (Section::Metadata, b"metadata") | (Section::Manifest, b"manifest") => {
                            section = Section::Outside;
                        }
                        _ => {}
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !found_package {
            return Err(EpubError::OpfParseError("没有找到package根元素".to_string()));
        }

        Ok(Opf {
            version,
            unique_identifier,
            metadata,
            manifest,
        })
    }

    /// 解析清单项，缺少id、href或media-type的项目被忽略
    fn parse_manifest_item(e: &BytesStart, opf_dir: &str) -> Result<Option<ManifestItem>> {
        let mut id = String::new();
        let mut href = String::new();
        let mut media_type = String::new();
        let mut properties = None;

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| EpubError::XmlError(quick_xml::Error::InvalidAttr(e)))?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.local_name().as_ref() {
                b"id" => id = value,
                b"href" => href = value,
                b"media-type" => media_type = value,
                b"properties" => properties = Some(value),
                _ => {}
            }
        }

        if id.is_empty() || href.is_empty() || media_type.is_empty() {
            return Ok(None);
        }

        let mut item = ManifestItem::new(id, href, media_type, opf_dir);
        item.properties = properties;
        Ok(Some(item))
    }

    /// 根据ID获取清单项
    pub fn item_with_id(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// 按文档顺序返回指定类型的清单项
    pub fn items_of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &ManifestItem> {
        self.manifest.iter().filter(move |item| item.kind() == kind)
    }
}

/// 收集元素的全部属性，键为带前缀的属性名；命名空间声明不计入
fn collect_attributes(e: &BytesStart) -> Result<IndexMap<String, String>> {
    let mut attributes = IndexMap::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| EpubError::XmlError(quick_xml::Error::InvalidAttr(e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        attributes.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(attributes)
}

/// 把解析出的命名空间转换为URI字符串
///
/// 很多EPUB在 `<metadata>` 上忘记声明 `xmlns:dc`，这种情况下按常用前缀推断。
fn namespace_uri(resolved: &ResolveResult) -> String {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => String::from_utf8_lossy(uri).into_owned(),
        ResolveResult::Unknown(prefix) => match prefix.as_slice() {
            b"dc" => DC_NAMESPACE.to_string(),
            b"opf" => OPF_NAMESPACE.to_string(),
            _ => String::new(),
        },
        ResolveResult::Unbound => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_OPF: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
        <dc:title>三体</dc:title>
        <dc:creator id="creator1" opf:role="aut">刘慈欣</dc:creator>
        <dc:creator>Ken Liu</dc:creator>
        <dc:language>zh-CN</dc:language>
        <dc:identifier id="BookId">urn:uuid:1234</dc:identifier>
        <meta name="cover" content="cover"/>
        <meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
        <meta refines="#creator1" property="file-as">Liu, Cixin</meta>
        <meta charset="utf-8"/>
        <dc:subject>Science Fiction &amp; Fantasy</dc:subject>
    </metadata>
    <manifest>
        <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
        <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
        <item id="cover" href="images/cover.jpg" media-type="image/jpeg" properties="cover-image"/>
        <item id="broken" href="missing-media-type.xhtml"/>
    </manifest>
    <spine>
        <itemref idref="ch1"/>
    </spine>
</package>"##;

    fn values<'a>(opf: &'a Opf, namespace: &str, key: &str) -> Vec<&'a str> {
        opf.metadata
            .get(namespace, key)
            .iter()
            .map(|e| e.value.as_str())
            .collect()
    }

    #[test]
    fn test_package_attributes() {
        let opf = Opf::parse_xml(SAMPLE_OPF, "OEBPS").expect("解析OPF失败");
        assert_eq!(opf.version, "3.0");
        assert_eq!(opf.unique_identifier.as_deref(), Some("BookId"));
    }

    #[test]
    fn test_metadata_table() {
        let opf = Opf::parse_xml(SAMPLE_OPF, "OEBPS").unwrap();

        let namespaces: Vec<&str> = opf.metadata.namespaces().map(|(ns, _)| ns).collect();
        assert_eq!(namespaces, vec![DC_NAMESPACE, OPF_NAMESPACE]);

        assert_eq!(values(&opf, DC_NAMESPACE, "title"), vec!["三体"]);
        assert_eq!(values(&opf, DC_NAMESPACE, "creator"), vec!["刘慈欣", "Ken Liu"]);
        assert_eq!(values(&opf, DC_NAMESPACE, "subject"), vec!["Science Fiction & Fantasy"]);
        assert_eq!(values(&opf, OPF_NAMESPACE, "cover"), vec!["cover"]);
        assert_eq!(values(&opf, OPF_NAMESPACE, "dcterms:modified"), vec!["2024-01-01T00:00:00Z"]);
        assert_eq!(values(&opf, OPF_NAMESPACE, "file-as"), vec!["Liu, Cixin"]);

        // charset meta既没有name也没有property
        assert_eq!(opf.metadata.len(), 9);

        let creator = &opf.metadata.get(DC_NAMESPACE, "creator")[0];
        assert_eq!(creator.attributes.get("id").map(String::as_str), Some("creator1"));
        assert_eq!(creator.attributes.get("opf:role").map(String::as_str), Some("aut"));
    }

    #[test]
    fn test_dc_field_order() {
        let opf = Opf::parse_xml(SAMPLE_OPF, "OEBPS").unwrap();
        let (_, dc_fields) = opf.metadata.namespaces().next().unwrap();
        let keys: Vec<&str> = dc_fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "creator", "language", "identifier", "subject"]);
    }

    #[test]
    fn test_manifest() {
        let opf = Opf::parse_xml(SAMPLE_OPF, "OEBPS").unwrap();

        let ids: Vec<&str> = opf.manifest.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["ch2", "ch1", "cover"]);

        let cover = opf.item_with_id("cover").expect("应当找到封面条目");
        assert_eq!(cover.path, "OEBPS/images/cover.jpg");
        assert_eq!(cover.properties.as_deref(), Some("cover-image"));
        assert!(opf.item_with_id("nonexistent").is_none());

        assert_eq!(opf.items_of_kind(ItemKind::Document).count(), 2);
        assert_eq!(opf.items_of_kind(ItemKind::Image).count(), 1);
    }

    #[test]
    fn test_legacy_opf2_metadata() {
        let opf_xml = r#"<?xml version="1.0"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf">
<metadata>
<dc-metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:Title>Old Book</dc:Title>
<dc:creator>Somebody</dc:creator>
</dc-metadata>
</metadata>
<manifest/>
</package>"#;

        let opf = Opf::parse_xml(opf_xml, "").unwrap();
        assert_eq!(opf.version, "2.0");
        assert_eq!(values(&opf, DC_NAMESPACE, "Title"), vec!["Old Book"]);
        assert_eq!(values(&opf, DC_NAMESPACE, "creator"), vec!["Somebody"]);
        assert!(opf.manifest.is_empty());
    }

    #[test]
    fn test_undeclared_dc_prefix() {
        let opf_xml = concat!(
            r#"<package xmlns="http://www.idpf.org/2007/opf" version="2.0">"#,
            r#"<metadata><dc:title>No Namespace</dc:title><dc:description/></metadata>"#,
            r#"</package>"#
        );

        let opf = Opf::parse_xml(opf_xml, "").unwrap();
        assert_eq!(opf.metadata.dublin_core("title"), Some("No Namespace"));
        // 空元素也算一个值
        assert_eq!(values(&opf, DC_NAMESPACE, "description"), vec![""]);
    }

    #[test]
    fn test_collection_metadata_is_ignored() {
        let opf_xml = r#"<?xml version="1.0"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>合集</dc:title>
    </metadata>
    <manifest>
        <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    </manifest>
    <collection role="series">
        <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
            <dc:title>分卷</dc:title>
        </metadata>
        <manifest>
            <item id="extra" href="extra.xhtml" media-type="application/xhtml+xml"/>
        </manifest>
    </collection>
</package>"#;

        let opf = Opf::parse_xml(opf_xml, "").unwrap();
        assert_eq!(values(&opf, DC_NAMESPACE, "title"), vec!["合集"]);
        assert_eq!(opf.metadata.len(), 1);
        let ids: Vec<&str> = opf.manifest.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["ch1"]);
    }

    #[test]
    fn test_missing_package() {
        let result = Opf::parse_xml("<metadata></metadata>", "");
        assert!(matches!(result, Err(EpubError::OpfParseError(_))));
    }

    #[test]
    fn test_malformed_xml() {
        let result = Opf::parse_xml("<package><metadata></package>", "");
        assert!(matches!(result, Err(EpubError::OpfParseError(_))));
    }
}
