use crate::{RowLabeled, StorageCommand, Value};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    /// Every table the select reads.
    tables: Vec<String>,
    text: String,
    parameters: Vec<(String, Value)>,
}

impl CacheKey {
    pub(crate) fn new<'a>(
        tables: impl IntoIterator<Item = &'a str>,
        command: &StorageCommand,
    ) -> Self {
        Self {
            tables: tables.into_iter().map(str::to_string).collect(),
            text: command.text.clone(),
            parameters: command
                .parameters
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    rows: Vec<RowLabeled>,
    expires: Instant,
}

/// Rows of the selects on tables with caching enabled.
///
/// Entries expire after the table timeout, a write to any table a select reads drops its
/// entry.
#[derive(Default, Debug)]
pub(crate) struct ResultCache {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl ResultCache {
    pub(crate) fn get(&mut self, key: &CacheKey) -> Option<Vec<RowLabeled>> {
        let entry = self.entries.get(key)?;
        if entry.expires <= Instant::now() {
            self.entries.remove(key);
            return None;
        }
        Some(entry.rows.clone())
    }

    pub(crate) fn insert(&mut self, key: CacheKey, rows: Vec<RowLabeled>, timeout: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                rows,
                expires: Instant::now() + timeout,
            },
        );
    }

    pub(crate) fn invalidate(&mut self, table: &str) {
        self.entries.retain(|k, _| !k.tables.iter().any(|v| v == table));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RowLabeled {
        RowLabeled::new(["id".to_string()].into(), [Value::Int64(Some(1))].into())
    }

    #[test]
    fn expiry_and_invalidation() {
        let mut cache = ResultCache::default();
        let mut command = StorageCommand::new("SELECT \"id\" FROM \"a\" WHERE \"id\" = @p1;");
        command.add_parameter("@p1", Value::Int64(Some(1)));
        let key = CacheKey::new(["a"], &command);
        cache.insert(key.clone(), vec![row()], Duration::from_secs(60));
        assert_eq!(cache.get(&key).map(|v| v.len()), Some(1));

        command.add_parameter("@p1", Value::Int64(Some(2)));
        assert!(cache.get(&CacheKey::new(["a"], &command)).is_none());

        cache.invalidate("b");
        assert_eq!(cache.len(), 1);
        cache.invalidate("a");
        assert!(cache.get(&key).is_none());

        let joined = CacheKey::new(["a", "b"], &command);
        cache.insert(joined.clone(), vec![row()], Duration::from_secs(60));
        cache.invalidate("b");
        assert!(cache.get(&joined).is_none());

        cache.insert(key.clone(), vec![row()], Duration::ZERO);
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 0);
    }
}
