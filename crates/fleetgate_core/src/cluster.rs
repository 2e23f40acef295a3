//! Combined membership and grouping state.
//!
//! [`ClusterView`] is the only state shared between the bus handlers, the
//! health probe and routing calls. Compound updates that touch both the
//! membership store and the group registry run inside the registry's write
//! lock, so a START racing a STOP for the same id can never leave a group
//! pointing at a server the store no longer has.

use crate::groups::{GroupRegistry, ServerGroup};
use crate::membership::MembershipStore;
use fleetgate_protocol::{GroupAssignment, ServerRecord};
use parking_lot::RwLock;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct ClusterView {
    servers: MembershipStore,
    groups: RwLock<GroupRegistry>,
}

impl ClusterView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `record` and, if given, adds it to `group` in one step.
    ///
    /// Returns the record that was replaced, if the id was already known.
    pub fn register(
        &self,
        record: ServerRecord,
        group: Option<&GroupAssignment>,
    ) -> Option<ServerRecord> {
        let mut groups = self.groups.write();
        let server_id = record.id.clone();
        let previous = self.servers.register(record);
        if let Some(group) = group {
            groups.add_member(&group.group_id, group.fallback_eligible, &server_id);
        }
        previous
    }

    /// Removes `server_id` from every group and then from the store.
    ///
    /// Returns the removed record; `None` means the id was already gone.
    pub fn unregister(&self, server_id: &str) -> Option<ServerRecord> {
        let mut groups = self.groups.write();
        groups.remove_member(server_id, None);
        self.servers.unregister(server_id)
    }

    /// Drops a single group membership, leaving the server registered.
    pub fn leave_group(&self, server_id: &str, group_id: &str) -> bool {
        self.groups.write().remove_member(server_id, Some(group_id))
    }

    pub fn lookup(&self, server_id: &str) -> Option<ServerRecord> {
        self.servers.lookup(server_id)
    }

    pub fn snapshot_ids(&self) -> BTreeSet<String> {
        self.servers.snapshot_ids()
    }

    pub fn records(&self) -> Vec<ServerRecord> {
        self.servers.records()
    }

    /// Runs `f` against the group registry under the read lock.
    ///
    /// `f` must not block; it runs while writers are held off.
    pub fn with_groups<R>(&self, f: impl FnOnce(&GroupRegistry) -> R) -> R {
        f(&self.groups.read())
    }

    /// Snapshot of every group in registration order.
    pub fn groups(&self) -> Vec<ServerGroup> {
        self.groups.read().groups().to_vec()
    }

    pub fn groups_of(&self, server_id: &str) -> Vec<String> {
        self.groups
            .read()
            .groups_of(server_id)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.read().len()
    }

    /// `(group, server)` pairs whose server id has no record.
    ///
    /// Always empty while all mutation goes through this type.
    pub fn dangling_members(&self) -> Vec<(String, String)> {
        let groups = self.groups.read();
        groups
            .groups()
            .iter()
            .flat_map(|group| {
                group
                    .members()
                    .filter(|id| !self.servers.contains(id))
                    .map(|id| (group.id.clone(), id.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::Arc;

    fn lobby() -> GroupAssignment {
        GroupAssignment::new("lobby", true)
    }

    #[test]
    fn test_register_then_unregister() {
        let cluster = ClusterView::new();
        cluster.register(ServerRecord::new("lobby-1", "10.0.0.1", 25565), Some(&lobby()));
        assert_eq!(cluster.groups_of("lobby-1"), vec!["lobby".to_string()]);

        let removed = cluster.unregister("lobby-1");
        assert_eq!(removed.map(|r| r.id), Some("lobby-1".to_string()));
        assert!(cluster.lookup("lobby-1").is_none());
        assert!(cluster.groups_of("lobby-1").is_empty());
        // Group survives empty
        assert_eq!(cluster.group_count(), 1);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let cluster = ClusterView::new();
        assert!(cluster.unregister("ghost").is_none());
        assert_eq!(cluster.server_count(), 0);
    }

    #[test]
    fn test_leave_group_keeps_record() {
        let cluster = ClusterView::new();
        cluster.register(ServerRecord::new("shared", "10.0.0.1", 1), Some(&lobby()));
        cluster.register(
            ServerRecord::new("shared", "10.0.0.1", 1),
            Some(&GroupAssignment::new("minigame", false)),
        );

        assert!(cluster.leave_group("shared", "lobby"));
        assert!(cluster.lookup("shared").is_some());
        assert_eq!(cluster.groups_of("shared"), vec!["minigame".to_string()]);
    }

    #[test]
    fn test_concurrent_register_unregister_keeps_groups_consistent() {
        for _ in 0..20 {
            let cluster = Arc::new(ClusterView::new());
            let ids = ["lobby-a", "lobby-b"];

            let workers: Vec<_> = ids
                .iter()
                .map(|id| {
                    let cluster = cluster.clone();
                    let id = id.to_string();
                    std::thread::spawn(move || {
                        let mut rng = rand::thread_rng();
                        for _ in 0..500 {
                            if rng.gen_bool(0.5) {
                                cluster.register(ServerRecord::new(&id, "10.0.0.1", 25565), Some(&lobby()));
                            } else {
                                cluster.unregister(&id);
                            }
                            if rng.gen_ratio(1, 10) {
                                std::thread::yield_now();
                            }
                        }
                    })
                })
                .collect();

            let checker = {
                let cluster = cluster.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        assert!(cluster.dangling_members().is_empty());
                    }
                })
            };

            for worker in workers {
                worker.join().unwrap();
            }
            checker.join().unwrap();

            // Final state: group membership mirrors the store exactly
            for id in ids {
                let registered = cluster.lookup(id).is_some();
                let grouped = cluster.with_groups(|groups| groups.get("lobby").map(|g| g.contains(id)).unwrap_or(false));
                assert_eq!(registered, grouped, "{id} store/group mismatch");
            }
            assert!(cluster.dangling_members().is_empty());
        }
    }
}
