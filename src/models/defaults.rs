//! 内置模板
//!
//! 内置模板在进程启动时载入，不可编辑也不可删除。

use super::template::Template;

/// 模型需要替换的标题占位符
pub const TITLE_PLACEHOLDER: &str = "<% tp.file.title %>";

/// 内置模板的 id
pub const DEFAULT_TEMPLATE_IDS: [&str; 3] = ["standard", "brief", "methods"];

const STANDARD_TEMPLATE: &str = r#"
# <% tp.file.title %>

## Citation

> [!cite] Reference
> **Authors**:
> **Year**:
> **Journal**:
> **DOI**:

## Abstract

## Key Points

-
-
-

## Methods

### Sample Preparation
- Method used: [[SCoPE2]] / [[plexDIA]] / [[nPOP]]
- Cell type:
- Number of cells:

### Data Analysis
- Software: [[MaxQuant]] / [[DIA-NN]]
- Downstream: [[scp Package]]

## Results

### Main Findings
1.
2.
3.

### Figures

| Figure | Description |
|--------|-------------|
| Fig 1 | |
| Fig 2 | |

## Discussion

### Strengths
-

### Limitations
-

### Future Work
-

## Personal Notes

## Related Papers

-
"#;

const BRIEF_TEMPLATE: &str = r#"
# <% tp.file.title %>

## TL;DR
<!-- A 1-2 sentence summary of the entire paper -->

## Key Takeaways
1.
2.
3.

## Practical Application
<!-- How can this be used? -->

## Citation
- **Year**:
- **Authors**:
"#;

const METHODS_TEMPLATE: &str = r#"
# <% tp.file.title %>

## Methodological Deep Dive

### Experimental Design
- **Subjects/Samples**:
- **Controls**:
- **Variables**:

### Techniques Used
-
-

### Statistical Approach
-

## Results Validation
- Did the results support the hypothesis?
"#;

/// 返回内置模板列表，顺序固定：standard, brief, methods
pub fn default_templates() -> Vec<Template> {
    vec![
        builtin("standard", "Standard Obsidian Digest", STANDARD_TEMPLATE),
        builtin("brief", "Brief Summary", BRIEF_TEMPLATE),
        builtin("methods", "Methods & Data Focus", METHODS_TEMPLATE),
    ]
}

/// 判断 id 是否属于内置模板
pub fn is_default_id(id: &str) -> bool {
    DEFAULT_TEMPLATE_IDS.contains(&id)
}

fn builtin(id: &str, name: &str, content: &str) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        content: content.to_string(),
        is_default: true,
    }
}
