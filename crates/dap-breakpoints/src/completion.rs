//! Counted completion group for fanned-out adapter requests.
//!
//! The group starts with one pending slot held by the issuer. Each request
//! enlists a [`CompletionToken`] before it is sent; finishing or dropping a
//! token releases its slot. The callback runs when the last slot is released,
//! which can only happen after [`CompletionGroup::seal`], so responses that
//! arrive while requests are still being issued cannot complete the group
//! early.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type Callback = Box<dyn FnOnce() + Send>;

struct Shared {
    pending: AtomicUsize,
    on_complete: Mutex<Option<Callback>>,
}

impl Shared {
    fn release(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            let callback = self.on_complete.lock().take();
            if let Some(callback) = callback {
                callback();
            }
        }
    }
}

pub struct CompletionGroup {
    shared: Arc<Shared>,
    issued: usize,
}

/// One outstanding request of a [`CompletionGroup`].
pub struct CompletionToken {
    shared: Option<Arc<Shared>>,
}

impl CompletionGroup {
    pub fn new(on_complete: impl FnOnce() + Send + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                pending: AtomicUsize::new(1),
                on_complete: Mutex::new(Some(Box::new(on_complete))),
            }),
            issued: 0,
        }
    }

    /// Count one more request. Call before sending it.
    pub fn enlist(&mut self) -> CompletionToken {
        self.shared.pending.fetch_add(1, Ordering::AcqRel);
        self.issued += 1;
        CompletionToken {
            shared: Some(Arc::clone(&self.shared)),
        }
    }

    /// Stop enlisting; fires immediately when nothing is outstanding.
    ///
    /// Returns how many requests were enlisted.
    pub fn seal(self) -> usize {
        let issued = self.issued;
        self.shared.release();
        issued
    }
}

impl CompletionToken {
    pub fn finish(mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release();
        }
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release();
        }
    }
}
