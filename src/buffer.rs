//! Pooled Parser Buffers
//!
//! Thread-local free lists of `BytesMut` scratch buffers for the parsers
//! in this crate. Decoding a multipart body or reassembling folded header
//! blocks wants a few KB of workspace per call; pooling turns that from an
//! allocation per message into a stack pop.
//!
//! Thread-local storage keeps acquisition lock-free and contention-free.
//! Buffers return to the pool when the [`PooledBuffer`] guard drops; a
//! full free list discards instead of growing without bound.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;

/// Buffers kept per size class before returns are discarded.
const MAX_POOLED_PER_CLASS: usize = 32;

// ============================================================================
// Size Classes
// ============================================================================

/// Pool size classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferClass {
    /// 4 KB: header blocks, cookie strings.
    Small,
    /// 16 KB: typical body chunks.
    Medium,
    /// 64 KB: multipart file parts, bulk decode.
    Large,
    /// Anything bigger; pooled together, rounded to a power of two.
    Custom(usize),
}

impl BufferClass {
    /// Byte capacity of buffers in this class.
    #[inline]
    pub const fn capacity(self) -> usize {
        match self {
            Self::Small => 4096,
            Self::Medium => 16384,
            Self::Large => 65536,
            Self::Custom(n) => n.next_power_of_two(),
        }
    }

    /// Smallest class that fits `len` bytes.
    #[inline]
    pub const fn fitting(len: usize) -> Self {
        if len <= 4096 {
            Self::Small
        } else if len <= 16384 {
            Self::Medium
        } else if len <= 65536 {
            Self::Large
        } else {
            Self::Custom(len)
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
            Self::Custom(_) => 3,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Global pool counters.
#[derive(Debug, Default)]
pub struct PoolStats {
    reuses: AtomicU64,
    allocations: AtomicU64,
    returns: AtomicU64,
    discards: AtomicU64,
}

impl PoolStats {
    /// Buffers served from a free list.
    pub fn reuses(&self) -> u64 {
        self.reuses.load(Ordering::Relaxed)
    }

    /// Buffers freshly allocated.
    pub fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Buffers accepted back into a free list.
    pub fn returns(&self) -> u64 {
        self.returns.load(Ordering::Relaxed)
    }

    /// Buffers dropped because the free list was full.
    pub fn discards(&self) -> u64 {
        self.discards.load(Ordering::Relaxed)
    }

    /// Fraction of acquisitions served without allocating.
    pub fn reuse_ratio(&self) -> f64 {
        let reuses = self.reuses() as f64;
        let total = reuses + self.allocations() as f64;
        if total > 0.0 { reuses / total } else { 0.0 }
    }
}

static POOL_STATS: PoolStats = PoolStats {
    reuses: AtomicU64::new(0),
    allocations: AtomicU64::new(0),
    returns: AtomicU64::new(0),
    discards: AtomicU64::new(0),
};

/// Global pool statistics.
pub fn pool_stats() -> &'static PoolStats {
    &POOL_STATS
}

// ============================================================================
// Thread-Local Free Lists
// ============================================================================

struct FreeLists {
    lists: [Vec<BytesMut>; 4],
}

impl FreeLists {
    const fn new() -> Self {
        Self {
            lists: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }

    fn acquire(&mut self, class: BufferClass) -> BytesMut {
        let list = &mut self.lists[class.index()];
        // Custom buffers vary in size; a pooled one must actually fit.
        let reusable = match class {
            BufferClass::Custom(n) => list.last().is_some_and(|b| b.capacity() >= n),
            _ => !list.is_empty(),
        };
        if reusable {
            POOL_STATS.reuses.fetch_add(1, Ordering::Relaxed);
            let mut buf = list.pop().unwrap_or_default();
            buf.clear();
            buf
        } else {
            POOL_STATS.allocations.fetch_add(1, Ordering::Relaxed);
            BytesMut::with_capacity(class.capacity())
        }
    }

    fn release(&mut self, mut buf: BytesMut, class: BufferClass) {
        let list = &mut self.lists[class.index()];
        if list.len() < MAX_POOLED_PER_CLASS {
            buf.clear();
            list.push(buf);
            POOL_STATS.returns.fetch_add(1, Ordering::Relaxed);
        } else {
            POOL_STATS.discards.fetch_add(1, Ordering::Relaxed);
        }
    }
}

thread_local! {
    static FREE_LISTS: RefCell<FreeLists> = const { RefCell::new(FreeLists::new()) };
}

// ============================================================================
// Pooled Buffer
// ============================================================================

/// A pooled `BytesMut` that returns to its free list on drop.
pub struct PooledBuffer {
    inner: Option<BytesMut>,
    class: BufferClass,
}

impl PooledBuffer {
    /// The size class this buffer was leased from.
    #[inline]
    pub fn class(&self) -> BufferClass {
        self.class
    }

    /// Detach the buffer from the pool; it will not be returned.
    #[inline]
    pub fn into_inner(mut self) -> BytesMut {
        self.inner.take().expect("buffer already detached")
    }

    /// Freeze into immutable `Bytes`, bypassing the pool.
    #[inline]
    pub fn freeze(self) -> bytes::Bytes {
        self.into_inner().freeze()
    }
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.inner.as_ref().expect("buffer already detached")
    }
}

impl DerefMut for PooledBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut().expect("buffer already detached")
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.inner.take() {
            FREE_LISTS.with(|lists| lists.borrow_mut().release(buf, self.class));
        }
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("class", &self.class)
            .field("len", &self.inner.as_ref().map(|b| b.len()))
            .finish()
    }
}

// ============================================================================
// Acquisition
// ============================================================================

/// Acquire an empty buffer of the given class.
#[inline]
pub fn acquire(class: BufferClass) -> PooledBuffer {
    let inner = FREE_LISTS.with(|lists| lists.borrow_mut().acquire(class));
    PooledBuffer {
        inner: Some(inner),
        class,
    }
}

/// Acquire a buffer sized for at least `len` bytes.
#[inline]
pub fn acquire_for(len: usize) -> PooledBuffer {
    acquire(BufferClass::fitting(len))
}

/// Run a closure with a scratch buffer that goes straight back to the
/// pool afterwards.
#[inline]
pub fn with_buffer<F, R>(class: BufferClass, f: F) -> R
where
    F: FnOnce(&mut BytesMut) -> R,
{
    let mut buf = acquire(class);
    f(&mut buf)
}
