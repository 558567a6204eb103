//! 摘要请求构建
//!
//! 把 (文档, 模板, 语言) 打包为一次模型调用的载荷。纯函数，相同输入得到相同输出。

use crate::models::{DigestJob, Document, Language, TITLE_PLACEHOLDER};

/// 摘要请求构建器
#[derive(Debug, Clone, Default)]
pub struct DigestRequestBuilder;

impl DigestRequestBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建任务，模板原样嵌入指令中
    pub fn build(&self, document: Document, template_content: &str, language: Language) -> DigestJob {
        let instruction = build_instruction(template_content, language);
        DigestJob {
            label: document.name,
            source_bytes: document.bytes,
            mime_type: document.mime_type,
            template_content: template_content.to_string(),
            language,
            instruction,
        }
    }
}

/// 生成发送给模型的指令文本
pub fn build_instruction(template_content: &str, language: Language) -> String {
    let language_name = language.instruction_name();
    format!(
        r#"You are an expert academic researcher and data scientist.
Your task is to analyze the provided research paper and generate a comprehensive digest based strictly on the following Markdown template.

Output Language: {language_name}

Here is the template you must fill out:

```markdown
{template_content}
```

Instructions:
1. **Title**: Replace "{TITLE_PLACEHOLDER}" with the actual title of the paper.
2. **Structure**: Keep every section and heading of the template, in the same order.
3. **Citation**: Extract accurate citation details.
4. **WikiLinks**: For 'Method used', 'Software', and 'Downstream', use the [[WikiLink]] format if the terms are standard or mentioned in the template examples. Otherwise still format key technical terms as [[Term]].
5. **Accuracy**: Ensure facts, figures, and numbers are extracted accurately from the text.
6. **Missing Info**: If a section cannot be filled, write "N/A" or keep it brief.
7. **Figures**: Summarize the key figures in the table provided.
8. **Personal Notes**: Leave this section blank for the user.
9. **Formatting**: Return ONLY the raw Markdown text. Do not wrap it in ```markdown code blocks.
10. **Language**: Output all content in {language_name}, except for technical terms commonly used in English and the paper title, which keep their original form.
"#
    )
}
