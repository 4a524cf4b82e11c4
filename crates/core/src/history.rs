use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append-only record of message texts that produced a reply.
///
/// Cloning shares the underlying list. Nothing reads it to make decisions;
/// the last entry is only surfaced for logging.
#[derive(Clone, Debug, Default)]
pub struct RequestHistory {
    entries: Arc<Mutex<Vec<String>>>,
}

impl RequestHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, text: impl Into<String>) {
        self.lock().push(text.into());
    }

    pub fn last(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    // A panic while pushing cannot leave the Vec half-written.
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
