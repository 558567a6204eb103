use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\- ]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// 摘要模板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_default: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Template {
    /// 创建自定义模板，id 由名称派生
    pub fn custom(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: slugify(&name),
            name: name.trim().to_string(),
            content: content.into(),
            is_default: false,
        }
    }
}

/// 由模板名称派生文件系统安全的 id
///
/// 删除 `[A-Za-z0-9_\- ]` 以外的字符，去掉首尾空白，把连续空白替换为 `-`，再转小写。
/// 必须与模板服务端的规则一致，否则乐观写入的 id 会和服务端不一致。
pub fn slugify(name: &str) -> String {
    let cleaned = DISALLOWED.replace_all(name, "");
    WHITESPACE
        .replace_all(cleaned.trim(), "-")
        .to_ascii_lowercase()
}

/// 由 id 生成展示名称，例如 `my-template` -> `My Template`
pub fn display_name_from_id(id: &str) -> String {
    id.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
