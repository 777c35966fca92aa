//! Event types and sinks for observing a streamer.
//!
//! This module defines [`StreamEvent`] and a set of sinks to emit, collect, or
//! forward events while driving [`crate::stream::streamer::ChunkStreamer::tick_with_events`].
use crate::stream::builder::CategoryReport;
use crate::stream::chunk::ChunkId;

/// Describes state transitions inside the streamer.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The camera entered a different chunk (or the rings were recomputed).
    CameraChunkChanged {
        from: Option<ChunkId>,
        to: ChunkId,
    },

    /// A build job was appended to the queue.
    ChunkQueued { id: ChunkId },

    /// A chunk finished building and is now hot.
    ChunkBuilt {
        id: ChunkId,
        trees: usize,
        rocks: usize,
        /// Budget units spent on the build.
        units: u32,
        partial: bool,
    },

    /// A chunk was placed back into the hot map from cold storage.
    ChunkRestored { id: ChunkId },

    /// A hot chunk left every ring; its retention timer started.
    ChunkLeaving { id: ChunkId },

    /// A leaving chunk re-entered a ring before eviction.
    ChunkKept { id: ChunkId },

    /// A chunk's retention ran out and its record moved to cold storage.
    ChunkMovedToCold { id: ChunkId },

    /// A record was dropped entirely; revisiting rebuilds it.
    ChunkDiscarded { id: ChunkId },

    /// A category could not reach its target within the attempt cap.
    ChunkExhausted { id: ChunkId, report: CategoryReport },

    /// Non-fatal warning.
    Warning {
        /// Context string (e.g. chunk key).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// A generic event sink that accepts [`StreamEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: StreamEvent);

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = StreamEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: StreamEvent) {}
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(StreamEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(StreamEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(StreamEvent),
{
    #[inline]
    fn send(&mut self, event: StreamEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<StreamEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<StreamEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[StreamEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: StreamEvent) {
        self.events.push(event);
    }
}

/// Forwards to the sink behind the reference.
impl<S: EventSink + ?Sized> EventSink for &mut S {
    #[inline]
    fn send(&mut self, event: StreamEvent) {
        (**self).send(event);
    }
}

/// Fan-out: both sinks receive every event, first `.0` then `.1`.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn send(&mut self, event: StreamEvent) {
        self.0.send(event.clone());
        self.1.send(event);
    }
}

/// Running totals of streamer transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub camera_changes: usize,
    pub queued: usize,
    pub built: usize,
    pub restored: usize,
    pub leaving: usize,
    pub kept: usize,
    pub moved_to_cold: usize,
    pub discarded: usize,
    /// Categories that stopped on the attempt cap.
    pub exhausted: usize,
    pub warnings: usize,
}

impl EventSink for EventCounts {
    fn send(&mut self, event: StreamEvent) {
        let counter = match event {
            StreamEvent::CameraChunkChanged { .. } => &mut self.camera_changes,
            StreamEvent::ChunkQueued { .. } => &mut self.queued,
            StreamEvent::ChunkBuilt { .. } => &mut self.built,
            StreamEvent::ChunkRestored { .. } => &mut self.restored,
            StreamEvent::ChunkLeaving { .. } => &mut self.leaving,
            StreamEvent::ChunkKept { .. } => &mut self.kept,
            StreamEvent::ChunkMovedToCold { .. } => &mut self.moved_to_cold,
            StreamEvent::ChunkDiscarded { .. } => &mut self.discarded,
            StreamEvent::ChunkExhausted { .. } => &mut self.exhausted,
            StreamEvent::Warning { .. } => &mut self.warnings,
        };
        *counter += 1;
    }
}
