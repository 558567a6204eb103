pub mod defaults;
pub mod digest;
pub mod loaders;
pub mod template;

pub use defaults::{default_templates, is_default_id, TITLE_PLACEHOLDER};
pub use digest::{
    is_supported_document, mime_type_for, output_file_name, DigestJob, DigestResult, Document,
    Language, ReasoningEffort,
};
pub use loaders::{discover_documents, load_document};
pub use template::{display_name_from_id, slugify, Template};
