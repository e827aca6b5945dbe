//! Ordered, short-circuiting chain of message handlers.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    tracing::{debug, info},
};

use crate::{Result, message::InboundMessage};

/// What the pipeline should do after a handler has seen a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandlerAction {
    /// Hand the message to the next handler.
    #[default]
    Continue,
    /// The message has been dealt with; skip the remaining handlers.
    Stop,
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// A short name used in logs and stats.
    fn name(&self) -> &str;

    async fn handle(&self, message: &InboundMessage) -> Result<HandlerAction>;
}

/// Per-handler counters.
#[derive(Debug, Default)]
pub struct HandlerStats {
    pub call_count: AtomicU64,
    pub stop_count: AtomicU64,
    pub failure_count: AtomicU64,
    pub total_latency_us: AtomicU64,
}

impl HandlerStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, latency: Duration, outcome: &Result<HandlerAction>) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        match outcome {
            Ok(HandlerAction::Continue) => {},
            Ok(HandlerAction::Stop) => {
                self.stop_count.fetch_add(1, Ordering::Relaxed);
            },
            Err(_) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
            },
        }
        self.total_latency_us.fetch_add(
            u64::try_from(latency.as_micros()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
    }

    pub fn calls(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn stops(&self) -> u64 {
        self.stop_count.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn avg_latency(&self) -> Duration {
        let calls = self.calls();
        if calls == 0 {
            return Duration::ZERO;
        }
        let total = self.total_latency_us.load(Ordering::Relaxed);
        Duration::from_micros(total / calls)
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The named handler returned [`HandlerAction::Stop`].
    StoppedBy(String),
    /// Every handler returned [`HandlerAction::Continue`].
    Completed,
}

struct HandlerEntry {
    handler: Arc<dyn MessageHandler>,
    stats: Arc<HandlerStats>,
}

/// Runs registered handlers in order until one stops.
#[derive(Default)]
pub struct Pipeline {
    handlers: Vec<HandlerEntry>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; handlers run in registration order.
    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) {
        info!(handler = handler.name(), "message handler registered");
        self.handlers.push(HandlerEntry {
            handler,
            stats: Arc::new(HandlerStats::new()),
        });
    }

    pub fn with(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn handler_names(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|e| e.handler.name().to_string())
            .collect()
    }

    /// Get stats for a named handler. Returns None if not found.
    pub fn handler_stats(&self, name: &str) -> Option<Arc<HandlerStats>> {
        self.handlers
            .iter()
            .find(|e| e.handler.name() == name)
            .map(|e| Arc::clone(&e.stats))
    }

    /// Run `message` through the chain.
    ///
    /// Stops at the first [`HandlerAction::Stop`]. A handler error also ends
    /// the chain and is returned to the caller.
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<Dispatch> {
        for entry in &self.handlers {
            let name = entry.handler.name();
            let start = Instant::now();
            let outcome = entry.handler.handle(message).await;
            let latency = start.elapsed();
            entry.stats.record(latency, &outcome);

            match outcome? {
                HandlerAction::Continue => {
                    debug!(handler = name, message_id = %message.id, ?latency, "handler passed message on");
                },
                HandlerAction::Stop => {
                    debug!(
                        handler = name,
                        message_id = %message.id,
                        ?latency,
                        avg_latency = ?entry.stats.avg_latency(),
                        "handler stopped message"
                    );
                    return Ok(Dispatch::StoppedBy(name.to_string()));
                },
            }
        }
        Ok(Dispatch::Completed)
    }
}
