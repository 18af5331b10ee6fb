//! 元数据记录模块
//!
//! `MetadataRecord` 在一次提取中构建完成，返回后只读。
//! 序列化为JSON时的键顺序：元数据字段（按首次出现的顺序）、`custom_meta`、`cover_image`。

use crate::epub::error::Result;
use crate::epub::markup::CustomMetaEntry;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 自定义meta标签在JSON中的键
pub const CUSTOM_META_KEY: &str = "custom_meta";

/// 封面文件名在JSON中的键
pub const COVER_IMAGE_KEY: &str = "cover_image";

/// 一次提取得到的元数据记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    fields: IndexMap<String, Vec<String>>,
    custom_meta: Vec<CustomMetaEntry>,
    cover_image: Option<String>,
}

impl MetadataRecord {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_field(&mut self, key: &str, value: String) {
        self.fields.entry(key.to_string()).or_default().push(value);
    }

    pub(crate) fn push_custom_meta(&mut self, entry: CustomMetaEntry) {
        self.custom_meta.push(entry);
    }

    pub(crate) fn set_cover_image(&mut self, file_name: String) {
        self.cover_image = Some(file_name);
    }

    /// 全部元数据字段，字段名 → 值列表
    pub fn fields(&self) -> &IndexMap<String, Vec<String>> {
        &self.fields
    }

    /// 某个字段的全部值，字段不存在时为空
    pub fn values(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// 从OPF类内容条目中收集到的meta标签
    pub fn custom_meta(&self) -> &[CustomMetaEntry] {
        &self.custom_meta
    }

    /// 提取出的封面文件名
    pub fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    /// 格式化为两空格缩进的JSON，非ASCII字符不转义
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 写出JSON文件（UTF-8编码），已存在时覆盖
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// 与保留键同名的元数据字段会被保留键覆盖
    fn is_shadowed(&self, key: &str) -> bool {
        key == CUSTOM_META_KEY || (key == COVER_IMAGE_KEY && self.cover_image.is_some())
    }
}

impl Serialize for MetadataRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let visible = self.fields.iter().filter(|(key, _)| !self.is_shadowed(key));

        let mut map = serializer.serialize_map(None)?;
        for (key, values) in visible {
            map.serialize_entry(key, values)?;
        }
        map.serialize_entry(CUSTOM_META_KEY, &self.custom_meta)?;
        if let Some(cover_image) = &self.cover_image {
            map.serialize_entry(COVER_IMAGE_KEY, cover_image)?;
        }
        map.end()
    }
}
