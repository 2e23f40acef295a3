//! Fallback server selection.
//!
//! Policy: walk the groups in registration order and stop at the first one
//! that is fallback-eligible and has a live member, then pick uniformly among
//! that group's live members. Later groups are only considered when every
//! earlier eligible group is empty.

use crate::cluster::ClusterView;
use fleetgate_protocol::ServerRecord;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{trace, warn};

#[derive(Debug, Clone)]
pub struct FallbackSelector {
    cluster: Arc<ClusterView>,
}

impl FallbackSelector {
    pub fn new(cluster: Arc<ClusterView>) -> Self {
        Self { cluster }
    }

    /// Chooses a server to receive a player who has to be moved.
    ///
    /// Member ids are resolved against the membership store; an id without a
    /// record is skipped, never returned.
    pub fn choose_fallback(&self) -> Option<ServerRecord> {
        self.cluster.with_groups(|groups| {
            for group in groups.groups_eligible_for_fallback() {
                let live: Vec<ServerRecord> = group
                    .members()
                    .filter_map(|id| {
                        let record = self.cluster.lookup(id);
                        if record.is_none() {
                            warn!(
                                "⚠️ Group '{}' references unknown server '{}', skipping",
                                group.id, id
                            );
                        }
                        record
                    })
                    .collect();

                if let Some(choice) = live.choose(&mut rand::thread_rng()) {
                    trace!("Fallback chosen from group '{}': {}", group.id, choice.id);
                    return Some(choice.clone());
                }
            }
            None
        })
    }
}
