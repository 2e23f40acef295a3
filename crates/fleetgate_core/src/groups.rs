//! Server groups and their fallback eligibility.
//!
//! Groups are kept in the order they were first referenced. That order is the
//! fallback precedence: a group declared earlier (say "lobby") is always
//! preferred over a later one ("minigame") when both can take players.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// A named pool of backend servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerGroup {
    pub id: String,
    pub fallback_eligible: bool,
    members: BTreeSet<String>,
}

impl ServerGroup {
    fn new(id: &str, fallback_eligible: bool) -> Self {
        Self {
            id: id.to_string(),
            fallback_eligible,
            members: BTreeSet::new(),
        }
    }

    /// Member server ids in sorted order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn contains(&self, server_id: &str) -> bool {
        self.members.contains(server_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Group id to member ids, in group registration order.
///
/// Not synchronized on its own; [`crate::ClusterView`] guards it together
/// with the membership store.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<ServerGroup>,
    index: HashMap<String, usize>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `server_id` to `group_id`, creating the group on first reference.
    ///
    /// An existing group keeps the fallback flag it was created with.
    pub fn add_member(&mut self, group_id: &str, fallback_eligible: bool, server_id: &str) {
        let position = match self.index.get(group_id) {
            Some(&position) => {
                let group = &self.groups[position];
                if group.fallback_eligible != fallback_eligible {
                    debug!(
                        "Group '{}' keeps fallback={} (announced {})",
                        group_id, group.fallback_eligible, fallback_eligible
                    );
                }
                position
            }
            None => {
                self.groups.push(ServerGroup::new(group_id, fallback_eligible));
                self.index.insert(group_id.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        self.groups[position].members.insert(server_id.to_string());
    }

    /// Removes `server_id` from one group, or from every group when
    /// `group_id` is `None`. Returns whether any membership was removed.
    pub fn remove_member(&mut self, server_id: &str, group_id: Option<&str>) -> bool {
        match group_id {
            Some(group_id) => match self.index.get(group_id) {
                Some(&position) => self.groups[position].members.remove(server_id),
                None => false,
            },
            None => self
                .groups
                .iter_mut()
                .fold(false, |removed, group| group.members.remove(server_id) || removed),
        }
    }

    /// Fallback-eligible groups in registration order, empty ones included.
    pub fn groups_eligible_for_fallback(&self) -> impl Iterator<Item = &ServerGroup> {
        self.groups.iter().filter(|group| group.fallback_eligible)
    }

    pub fn get(&self, group_id: &str) -> Option<&ServerGroup> {
        self.index.get(group_id).map(|&position| &self.groups[position])
    }

    /// All groups in registration order.
    pub fn groups(&self) -> &[ServerGroup] {
        &self.groups
    }

    /// Ids of the groups `server_id` currently belongs to.
    pub fn groups_of(&self, server_id: &str) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|group| group.contains(server_id))
            .map(|group| group.id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reference_sets_fallback_flag() {
        let mut registry = GroupRegistry::new();
        registry.add_member("lobby", true, "lobby-1");
        registry.add_member("lobby", false, "lobby-2");

        let lobby = registry.get("lobby").unwrap();
        assert!(lobby.fallback_eligible);
        assert_eq!(lobby.members().collect::<Vec<_>>(), vec!["lobby-1", "lobby-2"]);
    }

    #[test]
    fn test_eligible_groups_follow_registration_order() {
        let mut registry = GroupRegistry::new();
        registry.add_member("minigame", true, "mg-1");
        registry.add_member("staff", false, "staff-1");
        registry.add_member("lobby", true, "lobby-1");
        // Adding to an old group must not move it
        registry.add_member("minigame", true, "mg-2");

        let order: Vec<&str> = registry
            .groups_eligible_for_fallback()
            .map(|group| group.id.as_str())
            .collect();
        assert_eq!(order, vec!["minigame", "lobby"]);
    }

    #[test]
    fn test_remove_from_specific_group() {
        let mut registry = GroupRegistry::new();
        registry.add_member("lobby", true, "shared-1");
        registry.add_member("minigame", true, "shared-1");

        assert!(registry.remove_member("shared-1", Some("lobby")));
        assert!(!registry.get("lobby").unwrap().contains("shared-1"));
        assert!(registry.get("minigame").unwrap().contains("shared-1"));
        assert!(!registry.remove_member("shared-1", Some("unknown")));
    }

    #[test]
    fn test_remove_everywhere_keeps_empty_groups() {
        let mut registry = GroupRegistry::new();
        registry.add_member("lobby", true, "shared-1");
        registry.add_member("minigame", false, "shared-1");

        assert!(registry.remove_member("shared-1", None));
        assert!(registry.groups_of("shared-1").is_empty());
        assert_eq!(registry.len(), 2);
        assert!(registry.get("lobby").unwrap().is_empty());
        assert!(!registry.remove_member("shared-1", None));
    }
}
