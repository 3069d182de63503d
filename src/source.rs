//! Sources of the bytes being uploaded.
use crate::error::{Error, Result};

use bytes::Bytes;
use std::borrow::Cow;
use std::future::Future;
use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt as _, AsyncSeekExt as _};

/// Content type used when the file does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A file that can be uploaded.
///
/// The size and content type are fixed for the duration of an upload.
pub trait FileSource: Send + Sync {
    /// The size of the file in bytes.
    fn size(&self) -> u64;

    /// The declared content type of the file, if any.
    fn mime_type(&self) -> Option<&str>;

    /// Read the bytes in `range` into a buffer.
    fn read_range(&self, range: Range<u64>) -> impl Future<Output = Result<Bytes>> + Send;

    /// Read the whole file into a buffer.
    fn read_all(&self) -> impl Future<Output = Result<Bytes>> + Send {
        self.read_range(0..self.size())
    }

    /// The content type to send, falling back to `application/octet-stream`.
    fn content_type(&self) -> &str {
        match self.mime_type() {
            Some(mime) if !mime.is_empty() => mime,
            _ => DEFAULT_MIME_TYPE,
        }
    }
}

/// A file held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFile {
    bytes: Bytes,
    mime: Option<Cow<'static, str>>,
}

impl MemoryFile {
    /// Create a new `MemoryFile` with no declared content type.
    pub fn new<T: Into<Bytes>>(bytes: T) -> Self {
        Self {
            bytes: bytes.into(),
            mime: None,
        }
    }

    /// Set the declared content type.
    pub fn with_mime_type<T: Into<Cow<'static, str>>>(self, mime: T) -> Self {
        Self {
            mime: Some(mime.into()),
            ..self
        }
    }
}

impl FileSource for MemoryFile {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    async fn read_range(&self, range: Range<u64>) -> Result<Bytes> {
        let len = self.bytes.len() as u64;
        if range.start > range.end || range.end > len {
            let e = std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("range exceeds file of {len} bytes"),
            );
            return Err(Error::read(range, e));
        }
        Ok(self.bytes.slice(range.start as usize..range.end as usize))
    }
}

/// A file on the local filesystem.
///
/// Every read opens the file and seeks to the start of the range, so no file
/// handle is held between reads.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    size: u64,
    mime: Option<Cow<'static, str>>,
}

impl LocalFile {
    /// Open the file at `path`, reading its size from the filesystem.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::read(0..0, e))?;
        Ok(Self {
            path,
            size: meta.len(),
            mime: None,
        })
    }

    /// Set the declared content type.
    pub fn with_mime_type<T: Into<Cow<'static, str>>>(self, mime: T) -> Self {
        Self {
            mime: Some(mime.into()),
            ..self
        }
    }

    /// Returns the path of this file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSource for LocalFile {
    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    async fn read_range(&self, range: Range<u64>) -> Result<Bytes> {
        let read = async {
            let mut file = tokio::fs::File::open(&self.path).await?;
            file.seek(SeekFrom::Start(range.start)).await?;
            let mut buf = vec![0; range.end.saturating_sub(range.start) as usize];
            file.read_exact(&mut buf).await?;
            Ok::<_, std::io::Error>(buf)
        };
        read.await
            .map(Bytes::from)
            .map_err(|e| Error::read(range, e))
    }
}
