//! In-process resolution cache.
//!
//! Keyed by class_type, populated lazily from oracle results, never
//! invalidated; entries are assumed stable for the life of the process.
//! A single mutex serializes writers; concurrent resolutions of the same
//! name converge on one oracle call instead of racing duplicates.

use crate::resolver::oracle::ResolvedNode;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, ResolvedNode>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class_type: &str) -> Option<ResolvedNode> {
        self.entries
            .lock()
            .expect("resolution cache poisoned")
            .get(class_type)
            .cloned()
    }

    /// Splits `names` into (cached hits, uncached remainder), preserving
    /// input order for the remainder.
    pub fn partition<'a>(
        &self,
        names: impl IntoIterator<Item = &'a String>,
    ) -> (Vec<(String, ResolvedNode)>, Vec<String>) {
        let entries = self.entries.lock().expect("resolution cache poisoned");
        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for name in names {
            match entries.get(name) {
                Some(node) => hits.push((name.clone(), node.clone())),
                None => misses.push(name.clone()),
            }
        }
        (hits, misses)
    }

    pub fn insert(&self, class_type: String, node: ResolvedNode) {
        self.entries
            .lock()
            .expect("resolution cache poisoned")
            .insert(class_type, node);
    }

    pub fn insert_all(&self, resolved: impl IntoIterator<Item = (String, ResolvedNode)>) {
        let mut entries = self.entries.lock().expect("resolution cache poisoned");
        for (class_type, node) in resolved {
            entries.insert(class_type, node);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("resolution cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
