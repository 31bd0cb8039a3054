use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::domain::ResumeFile;

/// Opaque reference to a rendered résumé preview, the equivalent of a blob object URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Issues and revokes preview handles, keeping count of the ones still alive so superseded
/// previews cannot pile up.
#[derive(Debug, Clone, Default)]
pub struct PreviewTracker {
    live: Arc<Mutex<BTreeSet<PreviewHandle>>>,
}

static PREVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl PreviewTracker {
    pub fn issue(&self, file: &ResumeFile) -> PreviewHandle {
        let id = PREVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let handle = PreviewHandle(format!("blob:resume/{id:06}/{}", file.file_name));
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.clone());
        handle
    }

    /// Release a handle. Returns `false` if it was already released.
    pub fn revoke(&self, handle: &PreviewHandle) -> bool {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
    }

    pub fn live_count(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
