//! 内容文档中 `<meta>` 标签的提取
//!
//! 先按严格的XML解析；XML格式有误时丢弃已得到的部分结果，
//! 改用 scraper 的HTML5容错解析重新查找。

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use scraper::{Html, Selector};
use serde::Serialize;

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta").expect("meta 是合法的CSS选择器"));

/// 单个 `<meta>` 标签的属性集合，属性名 → 属性值，保持书写顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CustomMetaEntry(IndexMap<String, String>);

impl CustomMetaEntry {
    /// 获取指定属性的值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// 全部属性
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.0
    }
}

impl FromIterator<(String, String)> for CustomMetaEntry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 按文档顺序收集内容中所有 `<meta>` 元素（任意深度）的属性
///
/// 此函数不会失败：无法按XML解析的内容交给HTML解析器处理。
pub fn collect_meta_tags(content: &[u8]) -> Vec<CustomMetaEntry> {
    let decoded = String::from_utf8_lossy(content);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&*decoded);

    match collect_from_xml(text) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("XML解析失败，改用HTML解析: {}", e);
            collect_from_html(text)
        }
    }
}

fn collect_from_xml(text: &str) -> Result<Vec<CustomMetaEntry>, quick_xml::Error> {
    let mut reader = Reader::from_str(text);
    let mut entries = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"meta" => {
                entries.push(xml_attributes(e)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn xml_attributes(e: &BytesStart) -> Result<CustomMetaEntry, quick_xml::Error> {
    let mut attributes = IndexMap::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(quick_xml::Error::InvalidAttr)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        attributes.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(CustomMetaEntry(attributes))
}

fn collect_from_html(text: &str) -> Vec<CustomMetaEntry> {
    let document = Html::parse_document(text);
    document
        .select(&META_SELECTOR)
        .map(|element| {
            element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        })
        .collect()
}
