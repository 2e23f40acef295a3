//! Authoritative local view of live backend servers.

use dashmap::DashMap;
use fleetgate_protocol::ServerRecord;
use std::collections::BTreeSet;

/// Concurrent map of server id to [`ServerRecord`].
///
/// Every operation is a single shard-level map operation, so the probe loop,
/// the bus handlers and routing calls never wait on each other for longer
/// than one insert or remove.
#[derive(Debug, Default)]
pub struct MembershipStore {
    servers: DashMap<String, ServerRecord>,
}

impl MembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the record for `record.id`.
    ///
    /// Returns the record that was replaced, if any.
    pub fn register(&self, record: ServerRecord) -> Option<ServerRecord> {
        self.servers.insert(record.id.clone(), record)
    }

    /// Removes the record for `id`. Unknown ids are a no-op returning `None`.
    pub fn unregister(&self, id: &str) -> Option<ServerRecord> {
        self.servers.remove(id).map(|(_, record)| record)
    }

    pub fn lookup(&self, id: &str) -> Option<ServerRecord> {
        self.servers.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.servers.contains_key(id)
    }

    /// All ids currently registered, sorted.
    pub fn snapshot_ids(&self) -> BTreeSet<String> {
        self.servers.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn records(&self) -> Vec<ServerRecord> {
        let mut records: Vec<ServerRecord> =
            self.servers.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_an_upsert() {
        let store = MembershipStore::new();
        assert!(store.register(ServerRecord::new("lobby-1", "10.0.0.1", 25565)).is_none());

        let replaced = store.register(ServerRecord::new("lobby-1", "10.0.0.2", 25566));
        assert_eq!(replaced, Some(ServerRecord::new("lobby-1", "10.0.0.1", 25565)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("lobby-1").unwrap().host, "10.0.0.2");
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let store = MembershipStore::new();
        assert!(store.unregister("ghost").is_none());

        store.register(ServerRecord::new("lobby-1", "10.0.0.1", 25565));
        assert!(store.unregister("lobby-1").is_some());
        assert!(store.unregister("lobby-1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_ids() {
        let store = MembershipStore::new();
        store.register(ServerRecord::new("mg-2", "10.0.0.3", 1));
        store.register(ServerRecord::new("lobby-1", "10.0.0.1", 2));

        let ids: Vec<String> = store.snapshot_ids().into_iter().collect();
        assert_eq!(ids, vec!["lobby-1".to_string(), "mg-2".to_string()]);
    }
}
