//! Endpoint set merging
//!
//! Endpoints are compared verbatim: no scheme, host or case normalization
//! happens here. Producers are responsible for canonical forms.

use std::collections::HashSet;

/// Merge `incoming` into `current`.
///
/// Returns `Some(merged)` when `incoming` holds at least one endpoint missing
/// from `current`, and `None` when the union equals `current` as a set.
/// The merged list keeps `current` first, followed by new endpoints in the
/// order they appear in `incoming`, without repetitions.
pub fn merge_endpoints(current: &[String], incoming: &[String]) -> Option<Vec<String>> {
    let known: HashSet<&str> = current.iter().map(String::as_str).collect();

    if incoming.iter().all(|e| known.contains(e.as_str())) {
        return None;
    }

    let mut seen = HashSet::with_capacity(known.len() + incoming.len());
    let merged = current
        .iter()
        .chain(incoming.iter())
        .filter(|e| seen.insert(e.as_str()))
        .cloned()
        .collect();

    Some(merged)
}

/// Drop repeated endpoints, keeping first-seen order
pub fn dedup_endpoints(endpoints: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(endpoints.len());
    endpoints
        .iter()
        .filter(|e| seen.insert(e.as_str()))
        .cloned()
        .collect()
}
