use crate::models::digest::{is_supported_document, Document};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 读取单个文档，MIME 类型由扩展名推断
pub async fn load_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取文档: {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("无效的文件路径: {}", path.display()))?;

    Ok(Document::from_bytes(name, bytes))
}

/// 扫描文件夹中所有可处理的文档，按文件名排序
///
/// 文件夹不存在时会先创建，然后返回空列表。
pub async fn discover_documents(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        fs::create_dir_all(folder)
            .await
            .with_context(|| format!("无法创建文件夹: {}", folder.display()))?;
        tracing::info!("已创建输入文件夹: {}", folder.display());
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    let mut entries = fs::read_dir(folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && is_supported_document(&path) {
            documents.push(path);
        } else {
            tracing::debug!("跳过不支持的文件: {}", path.display());
        }
    }

    documents.sort();
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discover_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "c.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let found = discover_documents(dir.path()).await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf", "c.png"]);
    }

    #[tokio::test]
    async fn test_discover_creates_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        let found = discover_documents(&input).await.unwrap();
        assert!(found.is_empty());
        assert!(input.is_dir());
    }

    #[tokio::test]
    async fn test_load_document_infers_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.jpg");
        std::fs::write(&path, [0xFF, 0xD8]).unwrap();

        let doc = load_document(&path).await.unwrap();
        assert_eq!(doc.name, "figure.jpg");
        assert_eq!(doc.mime_type, "image/jpeg");
        assert_eq!(doc.bytes, vec![0xFF, 0xD8]);
    }
}
