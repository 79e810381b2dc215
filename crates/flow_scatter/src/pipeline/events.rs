//! Event types and sinks for observing placement passes.
//!
//! This module defines [`PlacementEvent`] and a set of sinks to emit, collect, or
//! forward events while running [`crate::pipeline::runner::FlowRunner::place_with_events`].
use glam::Vec2;

use crate::pipeline::PlaceStats;
use crate::tube::Placement;

/// Describes events emitted during a placement pass.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum PlacementEvent {
    /// Emitted when a pass starts for a path.
    PassStarted {
        /// Index of the path in the batch.
        index: usize,
        /// The path id.
        path_id: String,
        /// Curve length in render units.
        curve_length: f32,
        /// Number of generator assignments on the path.
        generator_count: usize,
    },

    /// Emitted for every placement that survived collision checks.
    PlacementAccepted {
        path_id: String,
        /// Index of the placement within the pass.
        index: usize,
        placement: Placement,
    },

    /// Emitted after an instance was generated and transformed.
    InstanceCreated {
        path_id: String,
        instance_id: String,
        generator_type: String,
        position: Vec2,
    },

    /// Emitted when a pass finishes.
    PassFinished {
        index: usize,
        path_id: String,
        stats: PlaceStats,
    },

    /// Non-fatal warning generated during a pass.
    Warning {
        /// Context string (e.g. path id).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Coarse event categories used to skip building unwanted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementEventKind {
    PassStarted,
    PlacementAccepted,
    InstanceCreated,
    PassFinished,
    Warning,
}

impl PlacementEvent {
    pub fn kind(&self) -> PlacementEventKind {
        match self {
            PlacementEvent::PassStarted { .. } => PlacementEventKind::PassStarted,
            PlacementEvent::PlacementAccepted { .. } => PlacementEventKind::PlacementAccepted,
            PlacementEvent::InstanceCreated { .. } => PlacementEventKind::InstanceCreated,
            PlacementEvent::PassFinished { .. } => PlacementEventKind::PassFinished,
            PlacementEvent::Warning { .. } => PlacementEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`PlacementEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: PlacementEvent);

    /// Whether events of `kind` should be built at all.
    fn wants(&self, _kind: PlacementEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: PlacementEvent) {}

    #[inline]
    fn wants(&self, _kind: PlacementEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally filtered by kind.
#[derive(Default)]
pub struct VecSink {
    events: Vec<PlacementEvent>,
    only: Option<Vec<PlacementEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects only events of the given kinds.
    pub fn only(kinds: impl IntoIterator<Item = PlacementEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<PlacementEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[PlacementEvent] {
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
    fn send(&mut self, event: PlacementEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: PlacementEventKind) -> bool {
        self.only.as_ref().is_none_or(|k| k.contains(&kind))
    }
}
