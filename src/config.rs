//! 提取配置模块
//!
//! 命令行工具可以通过 `--config` 读取一个YAML配置文件，调整输出文件的命名、
//! 输出目录以及封面条目的ID。配置文件中没有出现的字段使用默认值。
//!
//! ```yaml
//! cover_id: cover
//! cover_suffix: _cover.jpg
//! metadata_suffix: _metadata.json
//! output_dir: out
//! ```

use crate::epub::error::{EpubError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认的封面条目ID
pub const DEFAULT_COVER_ID: &str = "cover";

/// 默认的封面文件后缀
pub const DEFAULT_COVER_SUFFIX: &str = "_cover.jpg";

/// 默认的元数据文件后缀
pub const DEFAULT_METADATA_SUFFIX: &str = "_metadata.json";

/// 元数据提取配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// 作为封面的manifest条目ID，只做精确匹配
    pub cover_id: String,
    /// 封面文件名后缀，追加在去掉 `.epub` 的输入文件名之后
    pub cover_suffix: String,
    /// 元数据JSON文件名后缀，追加在去掉扩展名的输入文件名之后
    pub metadata_suffix: String,
    /// 输出目录；为空时封面写入当前工作目录，元数据JSON写在输入文件旁边
    pub output_dir: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            cover_id: DEFAULT_COVER_ID.to_string(),
            cover_suffix: DEFAULT_COVER_SUFFIX.to_string(),
            metadata_suffix: DEFAULT_METADATA_SUFFIX.to_string(),
            output_dir: None,
        }
    }
}

impl ExtractConfig {
    /// 从YAML文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    /// * `Result<Self>` - 文件不存在或格式错误时返回 `ConfigError`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EpubError::ConfigError(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;

        Self::from_yaml(&content)
    }

    /// 从YAML字符串解析配置
    pub fn from_yaml(content: &str) -> Result<Self> {
        // 空文件等价于全部使用默认值
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yml::from_str(content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))
    }

    /// 封面文件所在的目录
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or_else(|| Path::new("."))
    }
}
