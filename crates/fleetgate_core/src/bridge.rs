//! Bus dispatcher: topic name to typed handler.
//!
//! Handlers are registered per [`WireMessage`] type. The bridge decodes the
//! raw payload before the handler sees it, so a malformed message is dropped
//! at the decode step and never reaches component code. Every failure,
//! panics included, stops at the per-message boundary; one bad message never
//! ends a subscription.

use crate::error::{CoordinatorError, HandlerError};
use futures::future::BoxFuture;
use futures::FutureExt;
use fleetgate_protocol::{MessageBus, WireMessage};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type ErasedHandler = Arc<dyn Fn(&str) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

/// Message counters for the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Number of topics with a registered handler
    pub topics: usize,
    /// Payloads received from the bus
    pub received: u64,
    /// Payloads that were decoded and handled without error
    pub handled: u64,
    /// Payloads dropped because they did not decode
    pub decode_failures: u64,
    /// Payloads whose handler returned an error or panicked
    pub handler_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    handled: AtomicU64,
    decode_failures: AtomicU64,
    handler_failures: AtomicU64,
}

pub struct EventBridge {
    bus: Arc<dyn MessageBus>,
    handlers: HashMap<&'static str, ErasedHandler>,
    counters: Counters,
    shutdown: watch::Sender<bool>,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl EventBridge {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            bus,
            handlers: HashMap::new(),
            counters: Counters::default(),
            shutdown,
            started: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Registers the handler for messages of type `M` on `M::TOPIC`.
    ///
    /// A later registration for the same topic replaces the earlier one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fleetgate_core::EventBridge;
    /// use fleetgate_protocol::{MemoryBus, SendEvent};
    /// use std::sync::Arc;
    ///
    /// let mut bridge = EventBridge::new(Arc::new(MemoryBus::new()));
    /// bridge.on(|event: SendEvent| async move {
    ///     println!("send {} to {}", event.player_id, event.target_server_id);
    ///     Ok::<_, fleetgate_core::HandlerError>(())
    /// });
    /// assert_eq!(bridge.topics(), vec!["player_send"]);
    /// ```
    pub fn on<M, F, Fut>(&mut self, handler: F)
    where
        M: WireMessage,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |payload: &str| {
            let decoded = M::decode(payload);
            let handler = handler.clone();
            async move { handler(decoded?).await }.boxed()
        });

        if self.handlers.insert(M::TOPIC, erased).is_some() {
            debug!("Replaced handler for topic '{}'", M::TOPIC);
        }
    }

    /// Topics with a registered handler, sorted.
    pub fn topics(&self) -> Vec<&'static str> {
        let mut topics: Vec<&'static str> = self.handlers.keys().copied().collect();
        topics.sort_unstable();
        topics
    }

    /// Decodes and handles one payload, returning the handler's result.
    ///
    /// Unknown topics are ignored.
    pub async fn dispatch(&self, topic: &str, payload: &str) -> Result<(), HandlerError> {
        match self.handlers.get(topic) {
            Some(handler) => handler(payload).await,
            None => {
                debug!("No handler for topic '{}'", topic);
                Ok(())
            }
        }
    }

    /// Processes one payload the way the subscription loop does: counted,
    /// logged and never failing.
    pub async fn deliver(&self, topic: &str, payload: String) {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        let outcome = match AssertUnwindSafe(self.dispatch(topic, &payload))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(HandlerError::Panicked(panic_message(panic.as_ref()))),
        };

        match outcome {
            Ok(()) => {
                self.counters.handled.fetch_add(1, Ordering::Relaxed);
            }
            Err(HandlerError::Decode(e)) => {
                self.counters.decode_failures.fetch_add(1, Ordering::Relaxed);
                warn!("⚠️ Dropping malformed '{}' message {:?}: {}", topic, payload, e);
            }
            Err(e) => {
                self.counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                error!("❌ Handler for '{}' failed: {}", topic, e);
            }
        }
    }

    /// Subscribes to every registered topic and spawns one receive task each.
    ///
    /// Messages on one topic are handled in arrival order; topics proceed
    /// independently of each other.
    ///
    /// If any subscription fails, the loops already spawned are stopped and
    /// the bridge can be started again.
    pub async fn start(self: &Arc<Self>) -> Result<(), CoordinatorError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CoordinatorError::AlreadyStarted);
        }

        for topic in self.topics() {
            let mut subscription = match self.bus.subscribe(topic).await {
                Ok(subscription) => subscription,
                Err(e) => {
                    error!("❌ Subscribing to '{}' failed: {}", topic, e);
                    self.abort_receive_loops().await;
                    self.started.store(false, Ordering::SeqCst);
                    return Err(e.into());
                }
            };
            let mut shutdown = self.shutdown.subscribe();
            let bridge = self.clone();

            let task = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => break,
                        message = subscription.recv() => match message {
                            Some(payload) => bridge.deliver(topic, payload).await,
                            None => {
                                warn!("⚠️ Subscription to '{}' closed by the bus", topic);
                                break;
                            }
                        },
                    }
                }
                debug!("Receive loop for '{}' stopped", topic);
            });

            self.tasks.lock().push(task);
            info!("📡 Subscribed to '{}'", topic);
        }

        Ok(())
    }

    /// Stops every receive loop and waits for them to finish.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                error!("❌ Receive loop ended abnormally: {}", e);
            }
        }
    }

    async fn abort_receive_loops(&self) {
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.abort();
            // Wait until the loop has dropped its subscription
            let _ = task.await;
        }
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            topics: self.handlers.len(),
            received: self.counters.received.load(Ordering::Relaxed),
            handled: self.counters.handled.load(Ordering::Relaxed),
            decode_failures: self.counters.decode_failures.load(Ordering::Relaxed),
            handler_failures: self.counters.handler_failures.load(Ordering::Relaxed),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
