//! Reusable scratch buffers for the encoders.
//!
//! Idle buffers wait in a bounded channel. [`BufferPool::acquire`] takes one if
//! available and allocates otherwise, so callers never block on each other.
//! The returned [`PooledBuffer`] clears its contents and hands the buffer back
//! when dropped, on every exit path. A full pool drops the buffer instead.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender};

/// Concurrent pool of byte buffers.
pub struct BufferPool {
    idle_tx: Sender<Vec<u8>>,
    idle_rx: Receiver<Vec<u8>>,
    /// Initial capacity of freshly allocated buffers.
    buffer_capacity: usize,
    /// Buffers allocated because the pool was empty.
    allocations: AtomicUsize,
}

impl BufferPool {
    /// Creates a pool that retains at most `pool_capacity` idle buffers, each
    /// allocated with `buffer_capacity` bytes of room.
    pub fn new(pool_capacity: usize, buffer_capacity: usize) -> Self {
        let (idle_tx, idle_rx) = crossbeam_channel::bounded(pool_capacity);
        Self {
            idle_tx,
            idle_rx,
            buffer_capacity,
            allocations: AtomicUsize::new(0),
        }
    }

    /// Checks out an empty buffer.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = match self.idle_rx.try_recv() {
            Ok(buf) => buf,
            Err(_) => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(capacity = self.buffer_capacity, "buffer pool empty, allocating");
                Vec::with_capacity(self.buffer_capacity)
            }
        };
        PooledBuffer { buf, pool: self }
    }

    /// Number of buffers currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    /// Total buffers allocated because no idle buffer was available.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        // A full pool drops the buffer.
        let _ = self.idle_tx.try_send(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(64, 1024)
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle())
            .field("buffer_capacity", &self.buffer_capacity)
            .field("allocations", &self.allocations())
            .finish()
    }
}

/// Exclusively owned buffer on loan from a [`BufferPool`].
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
