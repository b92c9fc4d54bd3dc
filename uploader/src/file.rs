use std::path::{Path, PathBuf};

/// Where a selected file's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBody {
    Memory(Vec<u8>),
    /// Opened at write time and streamed, never held in memory whole
    Path(PathBuf),
}

/// A file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Declared MIME type, resolved from the extension when absent
    pub content_type: Option<String>,
    pub size: u64,
    pub body: FileBody,
}

impl SelectedFile {
    /// File held in memory
    #[must_use]
    pub fn from_bytes(name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(ToString::to_string),
            size: bytes.len() as u64,
            body: FileBody::Memory(bytes),
        }
    }

    /// File on disk; only its metadata is read here
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not point at a readable regular file
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            content_type: None,
            size: metadata.len(),
            body: FileBody::Path(path.to_path_buf()),
        })
    }

    /// Lower-cased extension of the file name, if any
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Loads the file's bytes
    ///
    /// # Errors
    ///
    /// Returns an error if a path-backed body can no longer be read
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.body {
            FileBody::Memory(bytes) => Ok(bytes.clone()),
            FileBody::Path(path) => tokio::fs::read(path).await,
        }
    }
}
