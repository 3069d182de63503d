use crate::BLOCK_SIZE;
use crate::block::{Block, BlockList};

use tokio::time::Instant;
use uuid::Uuid;

/// Position of the session before a block was started, restored if that
/// block fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Checkpoint {
    offset: u64,
    remaining: u64,
    block_size: u64,
    blocks: usize,
}

/// State of one chunked upload.
///
/// `offset() + remaining()` always equals the size of the file. A block is
/// counted in `block_ids()` and in `offset()` as soon as it is started; it
/// only counts toward `uploaded()` once it has been acknowledged, and is
/// rolled back entirely if it fails.
#[derive(Debug, Clone)]
pub struct UploadSession {
    id: Uuid,
    size: u64,
    block_ids: BlockList,
    offset: u64,
    remaining: u64,
    block_size: u64,
    uploaded: u64,
    started_at: Option<Instant>,
    committed: bool,
    failed: bool,
    in_flight: Option<Checkpoint>,
}

impl UploadSession {
    pub(crate) fn new(size: u64) -> Self {
        Self {
            id: Uuid::now_v7(),
            size,
            block_ids: BlockList::default(),
            offset: 0,
            remaining: size,
            block_size: BLOCK_SIZE.as_u64().min(size),
            uploaded: 0,
            started_at: None,
            committed: false,
            failed: false,
            in_flight: None,
        }
    }

    /// Unique ID of this session, for correlating logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Size in bytes of the file being uploaded.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// IDs of the blocks started so far, in upload order.
    pub fn block_ids(&self) -> &BlockList {
        &self.block_ids
    }

    /// Offset in the file of the next block.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes of the file not yet assigned to a block.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Size of the next block.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Bytes acknowledged by the remote endpoint.
    pub fn uploaded(&self) -> u64 {
        self.uploaded
    }

    /// When the first block was started.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Whether the block list has been committed.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Whether the last attempt to commit the block list failed.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub(crate) fn start_clock(&mut self) -> Instant {
        *self.started_at.get_or_insert_with(Instant::now)
    }

    /// Assign the next block and advance past it before it is uploaded.
    ///
    /// The block size shrinks to what is left once fewer than a full block
    /// of bytes remain.
    pub(crate) fn begin_block(&mut self) -> Option<Block> {
        if self.remaining == 0 {
            return None;
        }

        self.in_flight = Some(Checkpoint {
            offset: self.offset,
            remaining: self.remaining,
            block_size: self.block_size,
            blocks: self.block_ids.count(),
        });

        let block = Block::new(
            self.block_ids.count(),
            self.offset..self.offset + self.block_size,
        );
        self.block_ids.push(block.id.clone());
        self.offset += self.block_size;
        self.remaining -= self.block_size;
        if self.remaining < self.block_size {
            self.block_size = self.remaining;
        }

        trace!(session = %self.id, sequence = block.sequence, range = ?block.range, "began block");
        Some(block)
    }

    /// The block started last was acknowledged.
    pub(crate) fn acknowledge(&mut self, bytes: u64) {
        self.in_flight = None;
        self.uploaded += bytes;
    }

    /// Undo everything `begin_block` did for the block in flight.
    pub(crate) fn rollback(&mut self) {
        let Some(checkpoint) = self.in_flight.take() else {
            return;
        };
        self.offset = checkpoint.offset;
        self.remaining = checkpoint.remaining;
        self.block_size = checkpoint.block_size;
        self.block_ids.truncate(checkpoint.blocks);
        debug!(session = %self.id, offset = self.offset, remaining = self.remaining, "rolled back block");
    }

    pub(crate) fn set_committed(&mut self) {
        self.committed = true;
        self.failed = false;
    }

    pub(crate) fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }
}
