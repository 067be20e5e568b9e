// src/store/objects.rs

use std::path::PathBuf;

use async_trait::async_trait;

use super::StoreError;

// O colaborador de storage de objetos (anexos de atividades e arquivos
// de documentos). O contrato é o mínimo que as páginas usam: subir,
// montar a URL pública e remover.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Remoção best-effort em lote. Chaves inexistentes não são erro.
    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<(), StoreError>;
}

/// Implementação em disco local, sob um diretório raiz.
pub struct LocalObjectStore {
    root: PathBuf,
    base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self { root: root.into(), base_url: base_url.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        // Chaves são caminhos relativos simples; nada de subir diretório.
        for segment in [bucket, key] {
            if segment.is_empty()
                || segment.starts_with('/')
                || segment.contains("..")
                || segment.contains('\\')
            {
                return Err(StoreError::new(format!("invalid object key: {segment}")));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::new(format!("upload failed: {e}")))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::new(format!("upload failed: {e}")))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), bucket, key)
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<(), StoreError> {
        for key in keys {
            let path = self.object_path(bucket, key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::new(format!("remove failed: {e}"))),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_url_and_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost:3000/storage");

        store.upload("documents", "plans/floor.pdf", b"pdf".to_vec()).await.unwrap();
        assert!(dir.path().join("documents/plans/floor.pdf").exists());

        assert_eq!(
            store.public_url("documents", "plans/floor.pdf"),
            "http://localhost:3000/storage/documents/plans/floor.pdf"
        );

        store.remove("documents", &["plans/floor.pdf".to_string()]).await.unwrap();
        assert!(!dir.path().join("documents/plans/floor.pdf").exists());

        // Remover de novo não é erro.
        store.remove("documents", &["plans/floor.pdf".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost");
        assert!(store.upload("docs", "../escape.txt", vec![]).await.is_err());
    }
}
