use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 扩展名 -> MIME 类型，未知扩展名按 PDF 处理
static MIME_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "pdf" => "application/pdf",
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
};

const DEFAULT_MIME_TYPE: &str = "application/pdf";

/// 摘要输出语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    #[serde(alias = "cn")]
    Zh,
}

impl Language {
    /// 提示词中使用的语言名称
    pub fn instruction_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Zh => "Simplified Chinese",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "zh" | "cn" | "chinese" => Ok(Language::Zh),
            other => Err(format!("不支持的语言: {}", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 推理强度提示，原样转发给模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

impl FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            other => Err(format!("不支持的推理强度: {}", other)),
        }
    }
}

/// 待处理的文档（论文 PDF 或图片）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// 文件名，用于日志与输出命名
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// 根据文件名推断 MIME 类型后创建
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_type_for(Path::new(&name));
        Self::new(name, bytes, mime_type)
    }
}

/// 根据扩展名推断 MIME 类型
pub fn mime_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| MIME_TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// 是否为可处理的文档扩展名
pub fn is_supported_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MIME_TYPES.contains_key(ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 由输入文件名得到输出文件名：扩展名替换为 `.md`
pub fn output_file_name(input_name: &str) -> String {
    Path::new(input_name)
        .with_extension("md")
        .to_string_lossy()
        .into_owned()
}

/// 一次模型调用的完整载荷
///
/// 每次请求构建一次，由消费它的执行器独占。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestJob {
    /// 来源文件名
    pub label: String,
    pub source_bytes: Vec<u8>,
    pub mime_type: String,
    pub template_content: String,
    pub language: Language,
    /// 转发给模型的指令，本地不会执行
    pub instruction: String,
}

/// 成功生成的摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestResult {
    pub markdown: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("paper.PDF")), "application/pdf");
        assert_eq!(mime_type_for(Path::new("fig.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("scan.JPEG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("notes")), "application/pdf");
    }

    #[test]
    fn test_supported_documents() {
        assert!(is_supported_document(Path::new("a.pdf")));
        assert!(is_supported_document(Path::new("a.Jpg")));
        assert!(!is_supported_document(Path::new("a.txt")));
        assert!(!is_supported_document(Path::new("README")));
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("paper.pdf"), "paper.md");
        assert_eq!(output_file_name("nature.2024.v2.PDF"), "nature.2024.v2.md");
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("cn".parse::<Language>().unwrap(), Language::Zh);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
        let parsed: Language = serde_json::from_str("\"cn\"").unwrap();
        assert_eq!(parsed, Language::Zh);
    }
}
