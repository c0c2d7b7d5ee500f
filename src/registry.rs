//! Correlates a stream request with an earlier dispatch.
//!
//! The registry hands out `stream_{n}` identifiers from a monotonic counter
//! and holds each pending generation job until exactly one consumer claims
//! it. Claiming removes the entry, so identifiers are single-use and
//! consumed entries do not accumulate; a claimed identifier is
//! indistinguishable from one that never existed. Identifiers are never
//! reused within a registry's lifetime.
//!
//! The map is guarded by a mutex because jobs are registered and claimed
//! from different runtime threads; critical sections only touch the map.

use crate::chunk::ChunkStream;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Single-consumption store of pending generation jobs.
pub struct StreamRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: u64,
    jobs: HashMap<String, ChunkStream>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 0,
                jobs: HashMap::new(),
            }),
        }
    }

    /// Store a job and return its fresh identifier.
    pub fn register(&self, job: ChunkStream) -> String {
        let mut inner = self.inner.lock().unwrap();
        let id = format!("stream_{}", inner.next_id);
        inner.next_id += 1;
        inner.jobs.insert(id.clone(), job);
        debug!("registered job as {}", id);
        id
    }

    /// Take the job for an identifier, removing its entry. Returns `None`
    /// for identifiers that were never registered or were already claimed.
    pub fn claim(&self, id: &str) -> Option<ChunkStream> {
        let job = self.inner.lock().unwrap().jobs.remove(id);
        debug!("claim {} -> {}", id, if job.is_some() { "hit" } else { "miss" });
        job
    }

    /// Number of jobs registered but not yet claimed.
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().jobs.len()
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
