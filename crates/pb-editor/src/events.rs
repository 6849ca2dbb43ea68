//! Drag lifecycle events for the observability panel.
//!
//! Recording is fire-and-forget: a sink cannot fail, block, or influence an
//! edit, and the canvas behaves the same with no sink attached.

use kurbo::Point;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragEventKind {
    DragStart,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
    DragEnd,
}

impl DragEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DragEventKind::DragStart => "dragstart",
            DragEventKind::DragEnter => "dragenter",
            DragEventKind::DragOver => "dragover",
            DragEventKind::DragLeave => "dragleave",
            DragEventKind::Drop => "drop",
            DragEventKind::DragEnd => "dragend",
        }
    }
}

/// One logged lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragLogEvent {
    /// `{kind}-{sequence}`, unique per canvas.
    pub id: String,
    pub kind: DragEventKind,
    /// Milliseconds since the canvas was mounted.
    pub timestamp_ms: u64,
    /// Surface descriptor: `canvas`, `container-{id}`, `component-{id}`,
    /// `sidebar-{template}`.
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    pub extra: Map<String, Value>,
}

impl DragLogEvent {
    /// A drop that carries both a source and a destination path is a
    /// reorder of an existing node.
    pub fn is_reordering(&self) -> bool {
        self.extra.get("reordering") == Some(&Value::Bool(true))
    }

    fn mark_reordering(&mut self) {
        if self.kind == DragEventKind::Drop
            && self.extra.contains_key("sourcePath")
            && self.extra.contains_key("dropPath")
        {
            self.extra.insert("reordering".into(), Value::Bool(true));
            self.extra.insert("operation".into(), Value::from("move"));
        }
    }
}

/// Receives lifecycle events.
pub trait EventSink {
    fn record(&mut self, event: DragLogEvent);
}

/// Lets a host keep a handle on the sink it gave to the canvas. A sink that
/// is already borrowed elsewhere simply misses the event.
impl<S: EventSink> EventSink for Rc<RefCell<S>> {
    fn record(&mut self, event: DragLogEvent) {
        if let Ok(mut sink) = self.try_borrow_mut() {
            sink.record(event);
        }
    }
}

// ─── Event log ───────────────────────────────────────────────────────────

/// Bounded, newest-first event log with a pause switch.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<DragLogEvent>,
    capacity: usize,
    paused: bool,
    reorder_count: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            paused: false,
            reorder_count: 0,
        }
    }

    /// Newest first.
    pub fn events(&self) -> impl Iterator<Item = &DragLogEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn latest(&self) -> Option<&DragLogEvent> {
        self.events.front()
    }

    pub fn reorder_count(&self) -> u64 {
        self.reorder_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.reorder_count = 0;
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: DragLogEvent) {
        if self.paused {
            return;
        }
        if event.is_reordering() {
            self.reorder_count += 1;
        }
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }
}

// ─── Recorder ────────────────────────────────────────────────────────────

/// Builds events for a canvas and forwards them to its optional sink.
pub(crate) struct Recorder {
    sink: Option<Box<dyn EventSink>>,
    mounted_at: Instant,
    sequence: u64,
    dragover_seen: u64,
    sample_every: u32,
}

impl Recorder {
    pub(crate) fn new(mounted_at: Instant, sample_every: u32) -> Self {
        Self {
            sink: None,
            mounted_at,
            sequence: 0,
            dragover_seen: 0,
            sample_every,
        }
    }

    pub(crate) fn set_sink(&mut self, sink: Option<Box<dyn EventSink>>) {
        self.sink = sink;
    }

    pub(crate) fn record(
        &mut self,
        kind: DragEventKind,
        now: Instant,
        target: String,
        position: Option<Point>,
        extra: Map<String, Value>,
    ) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if kind == DragEventKind::DragOver {
            self.dragover_seen += 1;
            let every = u64::from(self.sample_every.max(1));
            if (self.dragover_seen - 1) % every != 0 {
                return;
            }
        }

        self.sequence += 1;
        let timestamp_ms =
            u64::try_from(now.saturating_duration_since(self.mounted_at).as_millis())
                .unwrap_or(u64::MAX);
        let mut event = DragLogEvent {
            id: format!("{}-{}", kind.as_str(), self.sequence),
            kind,
            timestamp_ms,
            target,
            position,
            extra,
        };
        event.mark_reordering();
        sink.record(event);
    }
}
