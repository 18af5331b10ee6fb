//! 测试用的EPUB构造工具

use crate::epub::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

/// 带封面和一个伪装成XHTML的OPF副本的OPF
pub(crate) const OPF_WITH_COVER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
        <dc:title>测试书籍</dc:title>
        <dc:creator opf:role="aut">作者甲</dc:creator>
        <dc:creator opf:role="aut">作者乙</dc:creator>
        <dc:language>zh-CN</dc:language>
        <dc:identifier id="BookId">978-1234567890</dc:identifier>
        <meta name="cover" content="cover"/>
    </metadata>
    <manifest>
        <item id="cover" href="images/cover.jpg" media-type="image/jpeg"/>
        <item id="chapter1" href="text/chapter1.xhtml" media-type="application/xhtml+xml"/>
        <item id="opf-copy" href="extra/content.opf.xhtml" media-type="application/xhtml+xml"/>
    </manifest>
    <spine>
        <itemref idref="chapter1"/>
    </spine>
</package>"#;

/// 没有封面条目、也没有OPF类内容条目的OPF
pub(crate) const OPF_PLAIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>Plain Book</dc:title>
        <dc:creator>Someone</dc:creator>
        <meta property="dcterms:modified">2024-05-01T10:00:00Z</meta>
    </metadata>
    <manifest>
        <item id="chapter1" href="text/chapter1.xhtml" media-type="application/xhtml+xml"/>
        <item id="cover-image" href="images/front.png" media-type="image/png" properties="cover-image"/>
    </manifest>
    <spine>
        <itemref idref="chapter1"/>
    </spine>
</package>"#;

/// 多个文件名像OPF的条目：两个可读的文档、一个非文档类型、一个没有存入压缩包
pub(crate) const OPF_MANY_PACKAGE_ITEMS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>多个OPF</dc:title>
    </metadata>
    <manifest>
        <item id="copy" href="extra/content.opf.xhtml" media-type="application/xhtml+xml"/>
        <item id="missing" href="missing.opf" media-type="text/html"/>
        <item id="b" href="b.opf" media-type="text/html"/>
        <item id="x" href="x.opf" media-type="application/oebps-package+xml"/>
    </manifest>
</package>"#;

pub(crate) const CHAPTER_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>第一章</title><meta name="chapter-meta" content="ignored"/></head>
<body><h1>第一章</h1><p>这是第一章的内容。</p></body>
</html>"#;

/// 内嵌在内容条目里的OPF副本，带两个meta标签
pub(crate) const EMBEDDED_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf">
    <metadata>
        <meta name="calibre:series" content="地球往事"/>
        <meta name="calibre:series_index" content="1"/>
    </metadata>
</package>"#;

pub(crate) const COVER_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

/// 测试用EPUB的内容描述
pub(crate) struct TestEpub {
    mimetype: Option<String>,
    files: Vec<(String, Vec<u8>)>,
}

impl TestEpub {
    /// 标准布局：mimetype、container.xml 以及 OEBPS/content.opf
    pub(crate) fn new(opf: &str) -> Self {
        Self {
            mimetype: Some("application/epub+zip".to_string()),
            files: vec![
                ("META-INF/container.xml".to_string(), CONTAINER_XML.as_bytes().to_vec()),
                ("OEBPS/content.opf".to_string(), opf.as_bytes().to_vec()),
            ],
        }
    }

    /// 带封面、章节与OPF副本的完整示例
    pub(crate) fn with_cover() -> Self {
        Self::new(OPF_WITH_COVER)
            .file("OEBPS/images/cover.jpg", COVER_BYTES)
            .file("OEBPS/text/chapter1.xhtml", CHAPTER_XHTML.as_bytes())
            .file("OEBPS/extra/content.opf.xhtml", EMBEDDED_OPF.as_bytes())
    }

    pub(crate) fn mimetype(mut self, mimetype: Option<&str>) -> Self {
        self.mimetype = mimetype.map(str::to_string);
        self
    }

    pub(crate) fn file(mut self, name: &str, content: &[u8]) -> Self {
        self.files.push((name.to_string(), content.to_vec()));
        self
    }

    pub(crate) fn without(mut self, name: &str) -> Self {
        self.files.retain(|(n, _)| n != name);
        self
    }

    pub(crate) fn write_to(&self, path: &Path) -> Result<()> {
        let mut zip = ZipWriter::new(File::create(path)?);

        if let Some(mimetype) = &self.mimetype {
            let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file("mimetype", stored)?;
            zip.write_all(mimetype.as_bytes())?;
        }

        for (name, content) in &self.files {
            zip.start_file(name.as_str(), SimpleFileOptions::default())?;
            zip.write_all(content)?;
        }

        zip.finish()?;
        Ok(())
    }
}
