use std::collections::HashSet;

/// Set of business names already emitted (or already dispatched) in this run
///
/// Names are compared after trimming surrounding whitespace. The set only
/// ever grows; there is no removal.
#[derive(Debug, Clone, Default)]
pub struct DedupSet {
    seen: HashSet<String>,
}

impl DedupSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the name has already been admitted
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name.trim())
    }

    /// Admits a name
    ///
    /// Returns `true` if the name is new, `false` if it is a repeat.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_string())
    }

    /// Number of distinct names admitted
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if no name has been admitted yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
