//! Kick rescue: keep a kicked player on the network by moving them to a
//! fallback server instead of dropping them.
//!
//! Each rescue is a spawned polling task owned by the player's entry in the
//! active map. The task ends on success, when no fallback exists, when it is
//! cancelled (logout, newer rescue for the same player) or on shutdown, and it
//! always removes its own entry on the way out.

use crate::error::HostError;
use crate::fallback::FallbackSelector;
use crate::host::ProxyHost;
use crate::probe::HealthProbe;
use crate::router::describe;
use dashmap::DashMap;
use fleetgate_protocol::{DisplayMessage, KickEvent, PlayerId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RescueState {
    Idle,
    Probing,
    Rescued,
    /// No fallback server was available; the player was disconnected
    Exhausted,
    Cancelled,
}

impl RescueState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RescueState::Rescued | RescueState::Exhausted | RescueState::Cancelled)
    }
}

/// What [`RescueCoordinator::handle_kick`] did with a kick.
#[derive(Debug)]
pub enum KickOutcome {
    /// The player is not on this proxy instance
    PlayerOffline,
    /// Non-rescuable kick; the player was disconnected with the kick message
    Disconnected,
    Rescuing(RescueHandle),
}

/// Observer for one running rescue.
#[derive(Debug)]
pub struct RescueHandle {
    player: PlayerId,
    state: watch::Receiver<RescueState>,
    task: JoinHandle<RescueState>,
}

impl RescueHandle {
    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn state(&self) -> RescueState {
        *self.state.borrow()
    }

    /// Waits for the rescue to finish and returns its final state.
    pub async fn wait(self) -> RescueState {
        self.task.await.unwrap_or(RescueState::Cancelled)
    }
}

struct ActiveRescue {
    generation: u64,
    cancel: watch::Sender<bool>,
}

#[derive(Clone)]
struct RescueTask {
    selector: FallbackSelector,
    host: Arc<dyn ProxyHost>,
    probe: HealthProbe,
    poll_interval: Duration,
    active: Arc<DashMap<PlayerId, ActiveRescue>>,
}

pub struct RescueCoordinator {
    task: RescueTask,
    next_generation: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl RescueCoordinator {
    pub fn new(
        selector: FallbackSelector,
        host: Arc<dyn ProxyHost>,
        probe: HealthProbe,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            task: RescueTask {
                selector,
                host,
                probe,
                poll_interval,
                active: Arc::new(DashMap::new()),
            },
            next_generation: AtomicU64::new(0),
            shutdown,
        }
    }

    /// Reacts to a `player_kick` event.
    pub async fn handle_kick(&self, kick: KickEvent) -> KickOutcome {
        let host = &self.task.host;
        if !host.is_player_online(kick.player_id) {
            debug!("Kick for {} ignored, player is not on this proxy", kick.player_id);
            return KickOutcome::PlayerOffline;
        }

        if !kick.rescuable {
            self.cancel(kick.player_id);
            info!("👢 Disconnecting {} ({})", kick.player_id, kick.reason);
            host.disconnect_player(kick.player_id, &kick.message).await;
            return KickOutcome::Disconnected;
        }

        let notice = DisplayMessage::concat(&[
            DisplayMessage::colored("You were kicked from your server. ", "red"),
            DisplayMessage::colored(&format!("({})", kick.reason_display), "gray"),
        ]);
        host.send_message(kick.player_id, &notice).await;

        KickOutcome::Rescuing(self.start(kick.player_id, kick.message))
    }

    /// Starts a rescue for `player`, replacing any rescue already running.
    pub fn start(&self, player: PlayerId, message: DisplayMessage) -> RescueHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancel_rx) = watch::channel(false);
        let (state, state_rx) = watch::channel(RescueState::Idle);

        if let Some(previous) = self
            .task
            .active
            .insert(player, ActiveRescue { generation, cancel })
        {
            debug!("Replacing rescue {} for {}", previous.generation, player);
            let _ = previous.cancel.send(true);
        }

        info!("🛟 Rescuing {}", player);
        let task = self.task.clone();
        let shutdown = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            let outcome = task.run(player, &message, cancel_rx, shutdown, &state).await;
            state.send_replace(outcome);
            task.active.remove_if(&player, |_, active| active.generation == generation);
            outcome
        });

        RescueHandle {
            player,
            state: state_rx,
            task: handle,
        }
    }

    /// Stops the rescue for `player`, if any. Returns whether one was running.
    pub fn cancel(&self, player: PlayerId) -> bool {
        match self.task.active.remove(&player) {
            Some((_, active)) => {
                let _ = active.cancel.send(true);
                debug!("Rescue for {} cancelled", player);
                true
            }
            None => false,
        }
    }

    pub fn is_rescuing(&self, player: PlayerId) -> bool {
        self.task.active.contains_key(&player)
    }

    pub fn active_count(&self) -> usize {
        self.task.active.len()
    }

    /// Cancels every running rescue and refuses to poll any further.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

impl RescueTask {
    async fn run(
        &self,
        player: PlayerId,
        message: &DisplayMessage,
        mut cancel: watch::Receiver<bool>,
        mut shutdown: watch::Receiver<bool>,
        state: &watch::Sender<RescueState>,
    ) -> RescueState {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        state.send_replace(RescueState::Probing);
        // Each candidate is health checked once per rescue
        let mut probed: HashSet<String> = HashSet::new();

        loop {
            if *shutdown.borrow() {
                return RescueState::Cancelled;
            }

            tokio::select! {
                biased;
                _ = cancel.changed() => return RescueState::Cancelled,
                _ = shutdown.changed() => return RescueState::Cancelled,
                _ = ticker.tick() => {}
            }

            let Some(candidate) = self.selector.choose_fallback() else {
                warn!("⚠️ No fallback server for {}, disconnecting", player);
                let failed = message.prefixed("Failed to rescue:", "red");
                self.host.disconnect_player(player, &failed).await;
                return RescueState::Exhausted;
            };

            if probed.insert(candidate.id.clone()) {
                self.probe.observe(&candidate);
            }

            match self.host.connect_player(player, &candidate).await {
                Ok(status) if status.is_successful() => {
                    info!("✅ Rescued {} to '{}'", player, candidate.id);
                    return RescueState::Rescued;
                }
                Ok(status) => {
                    debug!("Rescue of {} to '{}' not completed: {}", player, candidate.id, describe(status))
                }
                Err(HostError::PlayerOffline(_)) => {
                    debug!("{} left during rescue", player);
                    return RescueState::Cancelled;
                }
                Err(e) => debug!("Rescue of {} to '{}' failed: {}", player, candidate.id, e),
            }
        }
    }
}
