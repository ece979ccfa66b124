//! # Concurrent Fan-out
//!
//! Fetches a batch of ids concurrently and fails fast.
//!
//! ```text
//!   ids: [a, b, a, c]
//!          │ dedupe
//!          ▼
//!   JoinSet ─┬─ fetch(a) ──► ok
//!            ├─ fetch(b) ──► Err ──► abort the rest, return Err
//!            └─ fetch(c) ──► (aborted)
//! ```
//!
//! Every branch is owned by the `JoinSet`. Dropping the set (early
//! return, or the caller's future being dropped) aborts every branch
//! still in flight, so no lookup outlives the request that started it.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{UpstreamError, UpstreamResult};

/// Distinct ids in first-seen order. Rejects an empty list or a blank id.
pub fn distinct_ids(resource: &'static str, ids: &[String]) -> UpstreamResult<Vec<String>> {
    if ids.is_empty() {
        return Err(UpstreamError::EmptyBatch { resource });
    }

    let mut seen = HashSet::with_capacity(ids.len());
    let mut distinct = Vec::with_capacity(ids.len());
    for (index, id) in ids.iter().enumerate() {
        let id = id.trim();
        if id.is_empty() {
            return Err(UpstreamError::InvalidIdentifier {
                resource,
                reason: format!("entry {index} is blank"),
            });
        }
        if seen.insert(id.to_string()) {
            distinct.push(id.to_string());
        }
    }
    Ok(distinct)
}

/// Runs `fetch` for every distinct id concurrently.
///
/// On success the map holds exactly one entry per distinct id. On the
/// first failure all other branches are aborted and that error is
/// returned; no partial map is ever produced.
pub async fn fetch_all<V, F, Fut>(
    resource: &'static str,
    ids: &[String],
    fetch: F,
) -> UpstreamResult<HashMap<String, V>>
where
    V: Send + 'static,
    F: Fn(String) -> Fut,
    Fut: Future<Output = UpstreamResult<V>> + Send + 'static,
{
    let ids = distinct_ids(resource, ids)?;
    debug!(resource, count = ids.len(), "Fanning out lookups");

    let mut tasks = JoinSet::new();
    for id in ids {
        let lookup = fetch(id.clone());
        tasks.spawn(async move { (id, lookup.await) });
    }

    let mut results = HashMap::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (id, outcome) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tasks.abort_all();
                return Err(UpstreamError::TaskFailed(e.to_string()));
            }
        };

        match outcome {
            Ok(value) => {
                results.insert(id, value);
            }
            Err(err) => {
                warn!(resource, id = %id, error = %err, "Lookup failed, cancelling batch");
                tasks.abort_all();
                return Err(err);
            }
        }
    }

    Ok(results)
}
