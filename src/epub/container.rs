use crate::epub::error::{EpubError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// OPF包文件的媒体类型
pub const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// META-INF/container.xml 的解析结果
#[derive(Debug, Clone)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 只收集 `<rootfiles>` 内同时带有 full-path 与 media-type 的条目，
    /// 一个都没有时返回 `ContainerParseError`。
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut rootfiles = Vec::new();
        let mut buf = Vec::new();
        let mut in_rootfiles = false;

        loop {
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| EpubError::ContainerParseError(e.to_string()))?
            {
                Event::Start(ref e) if e.local_name().as_ref() == b"rootfiles" => {
                    in_rootfiles = true;
                }
                Event::Start(ref e) | Event::Empty(ref e)
                    if in_rootfiles && e.local_name().as_ref() == b"rootfile" =>
                {
                    let mut full_path = None;
                    let mut media_type = None;

                    for attr_result in e.attributes() {
                        let attr = attr_result
                            .map_err(|e| EpubError::ContainerParseError(e.to_string()))?;
                        let value = String::from_utf8_lossy(&attr.value).into_owned();
                        match attr.key.local_name().as_ref() {
                            b"full-path" => full_path = Some(value),
                            b"media-type" => media_type = Some(value),
                            _ => {}
                        }
                    }

                    if let (Some(full_path), Some(media_type)) = (full_path, media_type) {
                        if !full_path.is_empty() {
                            rootfiles.push(RootFile { full_path, media_type });
                        }
                    }
                }
                Event::End(ref e) if e.local_name().as_ref() == b"rootfiles" => {
                    in_rootfiles = false;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if rootfiles.is_empty() {
            return Err(EpubError::ContainerParseError(
                "没有找到任何rootfile条目".to_string(),
            ));
        }

        Ok(Container { rootfiles })
    }

    /// 获取主要的OPF文件路径
    ///
    /// 优先选择第一个OPF媒体类型的rootfile，否则退回到第一个rootfile。
    pub fn opf_path(&self) -> Option<&str> {
        self.rootfiles
            .iter()
            .find(|rf| rf.media_type == OPF_MEDIA_TYPE)
            .or_else(|| self.rootfiles.first())
            .map(|rf| rf.full_path.as_str())
    }
}
