//! Reusable scratch buffers for rendering entries

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Buffers kept for reuse.
const MAX_POOLED: usize = 32;

/// Buffers that grew past this capacity are released instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

const INITIAL_CAPACITY: usize = 512;

#[derive(Debug, Default)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an empty buffer. It goes back to the pool when the guard drops,
    /// on every exit path.
    pub fn get(&self) -> PooledBuffer<'_> {
        let buf = self
            .buffers
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        PooledBuffer { pool: self, buf }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.buffers.lock().len()
    }

    fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut buffers = self.buffers.lock();
        if buffers.len() < MAX_POOLED {
            buffers.push(buf);
        }
    }
}

/// Scoped handle to a pooled buffer.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
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
        self.pool.put(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_returned_on_drop() {
        let pool = BufferPool::new();
        assert_eq!(pool.idle(), 0);
        {
            let mut buf = pool.get();
            buf.extend_from_slice(b"hello");
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.get();
        assert!(buf.is_empty(), "reused buffer must be cleared");
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_buffer_returned_on_early_return() {
        fn render(pool: &BufferPool) -> Result<(), ()> {
            let mut buf = pool.get();
            buf.push(b'x');
            Err(())
        }

        let pool = BufferPool::new();
        assert!(render(&pool).is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_oversized_buffer_released() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.get();
            buf.reserve(MAX_RETAINED_CAPACITY * 2);
        }
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = BufferPool::new();
        let held: Vec<_> = (0..MAX_POOLED + 8).map(|_| pool.get()).collect();
        drop(held);
        assert_eq!(pool.idle(), MAX_POOLED);
    }
}
