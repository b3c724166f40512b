use std::sync::Arc;
use rayon::prelude::*;
use tracing::debug;
use crate::core::error::Result;
use crate::core::types::SessionId;
use crate::query::cache::{CacheStats, QueryCache, QueryKey};
use crate::query::matcher::RecordMatcher;
use crate::query::types::QuerySpec;
use crate::storage::record_store::RecordStore;

/// Ascending indices of matching records, produced on demand.
///
/// The scan is bounded by the store length seen when the query started;
/// records appended afterwards are not visited.
pub struct QueryMatches {
    store: Arc<RecordStore>,
    matcher: RecordMatcher,
    next: usize,
    end: usize,
}

impl QueryMatches {
    /// Number of records this query will look at in total.
    pub fn scan_len(&self) -> usize {
        self.end
    }
}

impl Iterator for QueryMatches {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.next < self.end {
            let index = self.next;
            self.next += 1;
            if let Some(record) = self.store.get(index) {
                if self.matcher.matches(record) {
                    return Some(index);
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.next))
    }
}

pub struct QueryEngine {
    cache: QueryCache,
}

impl QueryEngine {
    pub fn new(cache_size: usize) -> Self {
        QueryEngine {
            cache: QueryCache::new(cache_size),
        }
    }

    /// Lazy scan. A bad regex fails here, before any record is visited.
    pub fn query(store: &Arc<RecordStore>, spec: &QuerySpec) -> Result<QueryMatches> {
        let matcher = RecordMatcher::compile(spec)?;
        Ok(QueryMatches {
            store: store.clone(),
            matcher,
            next: 0,
            end: store.len(),
        })
    }

    /// Every match at once, scanned in parallel and cached per session.
    pub fn query_all(
        &self,
        session: SessionId,
        store: &RecordStore,
        spec: &QuerySpec,
    ) -> Result<Arc<Vec<usize>>> {
        let matcher = RecordMatcher::compile(spec)?;
        let scanned = store.len();
        let key = QueryKey {
            session,
            spec: spec.clone(),
            scanned,
        };

        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let matches: Vec<usize> = (0..scanned)
            .into_par_iter()
            .filter(|&index| store.get(index).is_some_and(|record| matcher.matches(record)))
            .collect();
        debug!(pattern = %spec.pattern, scanned, matched = matches.len(), "parallel query");

        let matches = Arc::new(matches);
        self.cache.put(key, matches.clone());
        Ok(matches)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Record;
    use serde_json::json;

    fn store() -> Arc<RecordStore> {
        let store = RecordStore::unbounded();
        store.append(Record::new(1, json!({"a": "x"}))).unwrap();
        store.append(Record::new(2, json!({"a": "y"}))).unwrap();
        store.append(Record::new(4, json!({"b": "x"}))).unwrap();
        Arc::new(store)
    }

    #[test]
    fn lazy_matches_are_ascending() {
        let store = store();
        let found: Vec<usize> = QueryEngine::query(&store, &QuerySpec::substring("x")).unwrap().collect();
        assert_eq!(found, vec![0, 2]);
    }

    #[test]
    fn scan_stops_at_length_seen_at_start() {
        let store = store();
        let matches = QueryEngine::query(&store, &QuerySpec::substring("")).unwrap();
        store.append(Record::new(5, json!({"a": "x"}))).unwrap();
        assert_eq!(matches.scan_len(), 3);
        assert_eq!(matches.count(), 3);
    }

    #[test]
    fn query_all_agrees_with_lazy_and_caches() {
        let engine = QueryEngine::new(8);
        let session = SessionId::new();
        let store = store();
        let spec = QuerySpec::substring("x").in_field("a");

        let first = engine.query_all(session, &store, &spec).unwrap();
        let lazy: Vec<usize> = QueryEngine::query(&store, &spec).unwrap().collect();
        assert_eq!(*first, lazy);

        let second = engine.query_all(session, &store, &spec).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cache_stats().hit_count, 1);
    }
}
