use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::oneshot;

use super::response_id;

#[derive(Debug, Default)]
struct PendingMap {
    closed: bool,
    waiters: HashMap<u64, oneshot::Sender<Value>>,
}

/// Outstanding calls keyed by request id.
///
/// Callers register before writing; the read loop resolves by id. Closing
/// drops every waiter, which fails its receiver.
#[derive(Debug, Default)]
pub struct PendingRequests {
    inner: Mutex<PendingMap>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `id`. `None` if closed or `id` is already pending.
    pub fn register(&self, id: u64) -> Option<oneshot::Receiver<Value>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if map.closed || map.waiters.contains_key(&id) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        map.waiters.insert(id, tx);
        Some(rx)
    }

    /// Drop the waiter for `id` without resolving it.
    pub fn cancel(&self, id: u64) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.waiters.remove(&id);
    }

    /// Route one raw line. Malformed JSON, missing ids and unknown ids are ignored.
    pub fn resolve_line(&self, line: &str) -> bool {
        match serde_json::from_str::<Value>(line) {
            Ok(message) => self.resolve(message),
            Err(e) => {
                tracing::debug!(error = %e, "discarding malformed line from backend");
                false
            }
        }
    }

    /// Hand `message` to the waiter matching its id. Returns whether one was found.
    pub fn resolve(&self, message: Value) -> bool {
        let Some(id) = response_id(&message) else {
            return false;
        };
        let waiter = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.waiters.remove(&id)
        };
        match waiter {
            Some(tx) => tx.send(message).is_ok(),
            None => {
                tracing::debug!(id, "response for unknown request id");
                false
            }
        }
    }

    /// Fail every outstanding call and refuse new ones. Returns how many were failed.
    pub fn close(&self) -> usize {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.closed = true;
        let failed = map.waiters.len();
        map.waiters.clear();
        failed
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
