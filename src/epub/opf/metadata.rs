//! 元数据处理模块
//!
//! OPF `<metadata>` 元素被读成一张按命名空间分组的元数据表：
//! 命名空间URI → 字段名 → 值列表。三层的顺序都保持文档中首次出现的顺序，
//! 同一字段的重复值（例如多个作者）全部保留。

use indexmap::IndexMap;

/// Dublin Core 元素的命名空间
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// OPF 包文件的命名空间
pub const OPF_NAMESPACE: &str = "http://www.idpf.org/2007/opf";

/// 元数据表中的一个值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// 元素的文本内容，或meta标签的content属性
    pub value: String,
    /// 元素属性（如 id、opf:role、scheme等），按出现顺序
    pub attributes: IndexMap<String, String>,
}

impl MetadataEntry {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attributes(value: impl Into<String>, attributes: IndexMap<String, String>) -> Self {
        Self {
            value: value.into(),
            attributes,
        }
    }
}

/// 单个命名空间下的字段表
pub type FieldTable = IndexMap<String, Vec<MetadataEntry>>;

/// OPF文件中的元数据表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    namespaces: IndexMap<String, FieldTable>,
}

impl MetadataTable {
    /// 创建空的元数据表
    pub fn new() -> Self {
        Self::default()
    }

    /// 在指定命名空间下追加一个字段值
    pub fn add(&mut self, namespace: &str, key: &str, entry: MetadataEntry) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push(entry);
    }

    /// 按首次出现的顺序遍历命名空间
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &FieldTable)> {
        self.namespaces.iter().map(|(ns, fields)| (ns.as_str(), fields))
    }

    /// 获取某个命名空间下某个字段的全部值
    pub fn get(&self, namespace: &str, key: &str) -> &[MetadataEntry] {
        self.namespaces
            .get(namespace)
            .and_then(|fields| fields.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 获取Dublin Core字段的第一个值
    pub fn dublin_core(&self, key: &str) -> Option<&str> {
        self.get(DC_NAMESPACE, key).first().map(|e| e.value.as_str())
    }

    /// (命名空间, 字段, 值) 三元组的总数
    pub fn len(&self) -> usize {
        self.namespaces
            .values()
            .flat_map(|fields| fields.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
