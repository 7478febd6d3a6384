//! In-memory caches for the HTTP server.
//!
//! - [`ResultCache`] memoizes reshape results by the exact upload bytes, so
//!   re-uploading the same file skips loading and reshaping.
//! - [`JobStore`] keeps finished reshapes by job id until they are
//!   downloaded as CSV or Excel.
//!
//! Both are bounded; the oldest entry is evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::transform::pipeline::PipelineResult;

/// Cache key: SHA-256 of the upload bytes plus the file name.
///
/// The name is part of the key because it decides how the bytes are parsed.
pub fn content_key(bytes: &[u8], filename: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((filename.len() as u64).to_le_bytes());
    hasher.update(filename.as_bytes());
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Insertion-ordered map with a capacity.
#[derive(Debug)]
struct Bounded<V> {
    capacity: usize,
    order: VecDeque<String>,
    entries: HashMap<String, V>,
}

impl<V> Bounded<V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Reshape results keyed by [`content_key`].
#[derive(Debug, Clone)]
pub struct ResultCache {
    inner: Arc<Mutex<Bounded<Arc<PipelineResult>>>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Bounded::new(capacity))),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<PipelineResult>> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(key).cloned()
    }

    pub fn insert(&self, key: String, result: Arc<PipelineResult>) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A finished reshape awaiting download.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub result: Arc<PipelineResult>,
}

/// Finished jobs keyed by id.
#[derive(Debug, Clone)]
pub struct JobStore {
    inner: Arc<Mutex<Bounded<Job>>>,
}

impl JobStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Bounded::new(capacity))),
        }
    }

    /// Register a result and return its new job.
    pub fn create(&self, file_name: &str, result: Arc<PipelineResult>) -> Job {
        let job = Job {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            created_at: Utc::now(),
            result,
        };
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(job.id.clone(), job.clone());
        job
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
