pub mod document_loader;

pub use document_loader::{discover_documents, load_document};
