use crate::frame::{Frame, FrameRecord};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Newest-first, bounded frame history shared by the ingestion worker and the
/// HTTP handlers.
///
/// Every operation takes the lock once and only for its own duration. Records
/// are handed out behind `Arc`, so a snapshot is a list of pointers and can be
/// serialized after the lock is released.
pub struct FrameStore {
    capacity: NonZeroUsize,
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    frames: VecDeque<Arc<FrameRecord>>,
    // Survives `clear`, ids are never reused.
    last_id: u64,
}

impl FrameStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(StoreInner {
                frames: VecDeque::new(),
                last_id: 0,
            }),
        }
    }

    /// Stores `frame` under the next id and returns that id. The oldest record
    /// is evicted when the store is full.
    pub fn append(&self, frame: Frame) -> u64 {
        let capacity = self.capacity.get();
        let mut inner = self.lock();

        inner.last_id += 1;
        let id = inner.last_id;
        inner.frames.push_front(Arc::new(FrameRecord { id, frame }));
        inner.frames.truncate(capacity);

        id
    }

    pub fn snapshot(&self) -> Vec<Arc<FrameRecord>> {
        self.lock().frames.iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().frames.clear();
    }

    pub fn size(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Largest id handed out so far, 0 before the first append.
    pub fn last_id(&self) -> u64 {
        self.lock().last_id
    }

    // No operation can leave the contents half-updated, so a poisoned lock
    // still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|err| {
            log::error!("Frame store lock was poisoned: {}", err);
            PoisonError::into_inner(err)
        })
    }
}
