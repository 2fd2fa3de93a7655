use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Single-writer gate shared by the substrates.
///
/// At most one [WriterPermit] exists at any time; [WriterGate::acquire]
/// blocks until the current holder drops its permit. Readers never touch
/// the gate.
#[derive(Clone, Default)]
pub struct WriterGate {
    inner: Arc<WriterGateInner>,
}

#[derive(Default)]
struct WriterGateInner {
    // thread that acquired the current permit
    holder: Mutex<Option<ThreadId>>,
    released: Condvar,
}

impl WriterGate {
    pub fn new() -> Self {
        WriterGate::default()
    }

    /// Blocks until the gate is free and returns the permit.
    ///
    /// Acquiring twice on one thread without dropping the first permit never
    /// returns; callers that may already hold a permit check
    /// [WriterGate::is_held_by_current_thread] first.
    pub fn acquire(&self) -> WriterPermit {
        let mut holder = self.inner.holder.lock();
        while holder.is_some() {
            self.inner.released.wait(&mut holder);
        }
        *holder = Some(thread::current().id());
        WriterPermit {
            inner: self.inner.clone(),
        }
    }

    pub fn try_acquire(&self) -> Option<WriterPermit> {
        let mut holder = self.inner.holder.lock();
        if holder.is_some() {
            return None;
        }
        *holder = Some(thread::current().id());
        Some(WriterPermit {
            inner: self.inner.clone(),
        })
    }

    pub fn is_held(&self) -> bool {
        self.inner.holder.lock().is_some()
    }

    /// Returns `true` if the current permit was acquired on this thread.
    pub fn is_held_by_current_thread(&self) -> bool {
        *self.inner.holder.lock() == Some(thread::current().id())
    }
}

pub struct WriterPermit {
    inner: Arc<WriterGateInner>,
}

impl Drop for WriterPermit {
    fn drop(&mut self) {
        let mut holder = self.inner.holder.lock();
        *holder = None;
        self.inner.released.notify_one();
    }
}
