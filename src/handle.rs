use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts the encoded values and ciphertexts a scheme has handed out and that
/// are still alive.
#[derive(Debug, Clone, Default)]
pub struct HandleTracker {
    live: Arc<AtomicUsize>,
}

impl HandleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> Handle {
        self.live.fetch_add(1, Ordering::Relaxed);
        Handle {
            live: Arc::clone(&self.live),
        }
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

/// Released when the owning value is dropped.
#[derive(Debug)]
pub struct Handle {
    live: Arc<AtomicUsize>,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}
