// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request coalescer.
//!
//! For a given key at most one computation is in flight process-wide; late
//! callers share the leader's result, success or error. The registry holds
//! a [`Shared`] handle per key: inserts and removals take the mutex, while
//! awaiting the shared future itself is lock-free. The leader entry removes
//! itself right before resolving, so a new call after completion starts a
//! fresh flight. Cancellation of any single caller does not cancel the
//! flight; the remaining callers keep polling it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

pub struct Singleflight<T: Clone> {
    inflight: Arc<Mutex<HashMap<String, Shared<BoxFuture<'static, T>>>>>,
}

impl<T: Clone> Default for Singleflight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Singleflight<T> {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Singleflight<T> {
    /// Join the in-flight computation for `key`, or become its leader by
    /// running `work`. The returned future yields the shared result.
    pub fn run<F, Fut>(&self, key: &str, work: F) -> Shared<BoxFuture<'static, T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut registry = self.inflight.lock().expect("coalescer registry poisoned");
        if let Some(flight) = registry.get(key) {
            return flight.clone();
        }

        let slot = Arc::clone(&self.inflight);
        let owned_key = key.to_string();
        let fut = work();
        let flight = async move {
            let out = fut.await;
            slot.lock()
                .expect("coalescer registry poisoned")
                .remove(&owned_key);
            out
        }
        .boxed()
        .shared();

        registry.insert(key.to_string(), flight.clone());
        flight
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight.lock().unwrap().len()
    }
}
