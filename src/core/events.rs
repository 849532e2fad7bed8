//! Double-buffered navigation event queue
//!
//! Systems push [`NavEvent`]s while they run; consumers read them after the
//! next [`EventQueue::swap`], so what a consumer sees never depends on the
//! order systems ran in within a step.
//!
//! # Example
//!
//! ```ignore
//! simulation.step();
//! for event in simulation.events().iter() {
//!     if let NavEvent::DestinationReached { entity } = event {
//!         log::info!("{entity:?} arrived");
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

use crate::ai::AiMode;

// ============================================================================
// Event Types
// ============================================================================

/// Something that happened to an agent during a step.
///
/// `#[non_exhaustive]` so new kinds can be added without breaking matches
/// that use a wildcard arm.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum NavEvent {
    /// The AI system applied a new mode
    ModeChanged {
        entity: Entity,
        /// `None` the first time a mode is applied
        from: Option<AiMode>,
        to: AiMode,
    },

    /// A path request succeeded
    PathFound {
        entity: Entity,
        /// Number of waypoints in the new plan
        waypoints: usize,
    },

    /// A path request failed; the agent stays put until something re-dirties it
    PathFailed { entity: Entity, goal: Vec3 },

    /// An intermediate waypoint was reached
    WaypointReached {
        entity: Entity,
        /// Index of the waypoint just reached
        index: usize,
    },

    /// The last waypoint was reached and the plan cleared
    DestinationReached { entity: Entity },
}

impl NavEvent {
    /// Entity the event is about
    #[must_use]
    pub fn entity(&self) -> Entity {
        match self {
            Self::ModeChanged { entity, .. }
            | Self::PathFound { entity, .. }
            | Self::PathFailed { entity, .. }
            | Self::WaypointReached { entity, .. }
            | Self::DestinationReached { entity } => *entity,
        }
    }
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue.
///
/// Events pushed during step N are readable during step N+1.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this step
    pending: VecDeque<NavEvent>,
    /// Events from the previous step, ready for reading
    processing: VecDeque<NavEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a queue with default capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a queue with the given initial capacity per buffer
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event; it becomes readable after the next `swap()`
    #[inline]
    pub fn push(&mut self, event: NavEvent) {
        self.pending.push_back(event);
    }

    /// Make this step's events readable and start a fresh pending buffer.
    ///
    /// Anything still unread from the previous step is dropped.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over the readable events
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &NavEvent> {
        self.processing.iter()
    }

    /// Take the readable events
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = NavEvent> + '_ {
        self.processing.drain(..)
    }

    /// No readable events
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of readable events
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Number of events waiting for the next swap
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop everything, pending and readable
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
