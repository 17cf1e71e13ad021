use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Put,
    Update,
    Remove,
    Evict,
    Truncate,
    BulkLoad,
    Query,
}

/// One entry of the store activity log
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub collection: String,
    pub items: usize,
    pub detail: String,
}

/// Destination of the activity log, injected at store construction
pub trait ActivitySink: Send + Sync {
    fn record(&self, event: ActivityEvent);
}

/// Emits every event as a `tracing` event
pub struct TracingSink;

impl ActivitySink for TracingSink {
    fn record(&self, event: ActivityEvent) {
        tracing::info!(
            target: "cachedenx::activity",
            kind = ?event.kind,
            collection = %event.collection,
            items = event.items,
            "{}",
            event.detail
        );
    }
}

pub struct NullSink;

impl ActivitySink for NullSink {
    fn record(&self, _event: ActivityEvent) {}
}

/// Keeps events in memory
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ActivityEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, kind: ActivityKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }
}

impl ActivitySink for RecordingSink {
    fn record(&self, event: ActivityEvent) {
        self.events.lock().push(event);
    }
}
