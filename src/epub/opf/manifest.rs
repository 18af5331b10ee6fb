//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义，以及href到ZIP条目路径的解析。

use percent_encoding::percent_decode_str;

/// 内容条目的类型，根据媒体类型划分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// HTML/XHTML内容文档
    Document,
    /// 图片
    Image,
    /// CSS样式表
    Stylesheet,
    /// NCX导航文件
    Navigation,
    /// 其他资源（字体、音频等）
    Other,
}

impl ItemKind {
    /// 根据媒体类型判断条目类型
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type.trim().to_ascii_lowercase();
        match media_type.as_str() {
            "application/xhtml+xml" | "text/html" => ItemKind::Document,
            "text/css" => ItemKind::Stylesheet,
            "application/x-dtbncx+xml" => ItemKind::Navigation,
            m if m.starts_with("image/") => ItemKind::Image,
            _ => ItemKind::Other,
        }
    }
}

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件，保持原样)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    pub properties: Option<String>,
    /// 在ZIP压缩包中的完整路径
    pub path: String,
}

impl ManifestItem {
    /// 创建新的清单项，`opf_dir` 为OPF文件所在目录
    pub fn new(id: String, href: String, media_type: String, opf_dir: &str) -> Self {
        let path = resolve_href(opf_dir, &href);
        Self {
            id,
            href,
            media_type,
            properties: None,
            path,
        }
    }

    /// 条目类型
    pub fn kind(&self) -> ItemKind {
        ItemKind::from_media_type(&self.media_type)
    }

    /// 文件名看起来是否为OPF包文件
    ///
    /// 以 `.opf` 结尾或包含 `content.opf` 的条目会被扫描其中的 `<meta>` 标签。
    pub fn is_package_like(&self) -> bool {
        self.href.ends_with(".opf") || self.href.contains("content.opf")
    }
}

/// 将相对于OPF目录的href解析为ZIP条目路径
///
/// 去掉片段标识(`#...`)，解码百分号编码，并规范化 `.` 与 `..` 路径段。
pub fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let href = percent_decode_str(href).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    // 以 / 开头的href相对于压缩包根目录
    if !href.starts_with('/') {
        segments.extend(base_dir.split('/').filter(|s| !s.is_empty()));
    }

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}
