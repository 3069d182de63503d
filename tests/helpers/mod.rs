pub mod sink;
pub use self::sink::Recorder;

use block_blob_upload::client::MemoryClient;
use block_blob_upload::client::request::Request;
use block_blob_upload::error::Result;
use block_blob_upload::source::{FileSource, MemoryFile};
use block_blob_upload::{UploadBuilder, Uploader};

use bytes::Bytes;
use std::ops::Range;
use std::sync::LazyLock;
use tracing_subscriber::EnvFilter;

pub const URL: &str = "https://acct.blob.example.net/uploads/file.bin?sv=2024-01-01&sig=abc";
pub const MIB5: u64 = 5_242_880;

pub static TRACER: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
});

pub fn uploader(client: &MemoryClient) -> Uploader {
    UploadBuilder::new(client.clone()).build()
}

/// Bytes whose value depends on position, so misplaced ranges are noticed.
pub fn patterned(size: usize) -> Bytes {
    (0..size).map(|n| (n % 251) as u8).collect::<Vec<_>>().into()
}

pub fn memory_file(size: usize) -> MemoryFile {
    MemoryFile::new(patterned(size))
}

pub fn is_block(req: &Request) -> bool {
    req.url().contains("&comp=block&")
}

pub fn is_commit(req: &Request) -> bool {
    req.url().ends_with("&comp=blocklist")
}

/// Bodies of the last request sent for each block ID, in first-sent order.
pub fn block_bodies(requests: &[Request]) -> Vec<(String, Bytes)> {
    let mut blocks: Vec<(String, Bytes)> = Vec::new();
    for req in requests.iter().filter(|r| is_block(r)) {
        let url = req.url().to_string();
        match blocks.iter_mut().find(|(u, _)| *u == url) {
            Some(entry) => entry.1 = req.body().clone(),
            None => blocks.push((url, req.body().clone())),
        }
    }
    blocks
}

/// A file that claims to be larger than the bytes it can read.
#[derive(Debug, Clone)]
pub struct TruncatedFile {
    pub inner: MemoryFile,
    pub claimed: u64,
}

impl FileSource for TruncatedFile {
    fn size(&self) -> u64 {
        self.claimed
    }

    fn mime_type(&self) -> Option<&str> {
        self.inner.mime_type()
    }

    async fn read_range(&self, range: Range<u64>) -> Result<Bytes> {
        self.inner.read_range(range).await
    }
}
