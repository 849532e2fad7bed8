//! Behavior tree engine
//!
//! Nodes are ticked once per simulation step against the world and the entity
//! that owns the tree. A node can answer [`BtStatus::Running`] to keep working
//! over several ticks; composites remember which child was running and resume
//! there on the next tick.
//!
//! # Design Principles
//!
//! - **Per-entity state**: every entity owns its own tree, so timers and child
//!   indices stored on nodes are never shared between entities
//! - **No side channel**: anything a node produces besides its status is
//!   written to components of the world it is handed
//! - **Open leaf set**: leaves are trait objects, new conditions and actions
//!   only need to implement [`BtNode`]
//!
//! # Example
//!
//! ```ignore
//! let mut root = selector(vec![
//!     sequence(vec![Box::new(SeePlayerCond), Box::new(SeekPlayerAction)]),
//!     Box::new(PatrolAction),
//! ]);
//! let status = root.tick(&mut world, entity, dt);
//! ```

use std::fmt;

use hecs::Entity;

use crate::ecs::World;

/// Result of ticking a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BtStatus {
    /// The node finished and succeeded
    Success,
    /// The node finished and failed
    Failure,
    /// The node needs more ticks
    Running,
}

/// A behavior tree node.
///
/// Nodes must be `Send + Sync` because trees are stored inside ECS components.
pub trait BtNode: fmt::Debug + Send + Sync {
    /// Node name for debugging and logging.
    fn name(&self) -> &'static str;

    /// Advance this node by `dt` seconds on behalf of `entity`.
    fn tick(&mut self, world: &mut World, entity: Entity, dt: f32) -> BtStatus;
}

/// Owned node pointer; composites own their children exclusively
pub type BoxedNode = Box<dyn BtNode>;

// ============================================================================
// Composites
// ============================================================================

/// Tries children in order until one does not fail.
///
/// - `Running` from a child is returned as-is and the selector resumes at
///   that child next tick
/// - `Success` resets the selector to its first child
/// - when every remaining child fails the selector resets and fails
#[derive(Debug)]
pub struct Selector {
    children: Vec<BoxedNode>,
    current: usize,
}

impl Selector {
    #[must_use]
    pub fn new(children: Vec<BoxedNode>) -> Self {
        Self {
            children,
            current: 0,
        }
    }

    /// Index of the child the next tick starts from
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn children(&self) -> &[BoxedNode] {
        &self.children
    }
}

impl BtNode for Selector {
    fn name(&self) -> &'static str {
        "Selector"
    }

    fn tick(&mut self, world: &mut World, entity: Entity, dt: f32) -> BtStatus {
        while self.current < self.children.len() {
            match self.children[self.current].tick(world, entity, dt) {
                BtStatus::Running => return BtStatus::Running,
                BtStatus::Success => {
                    self.current = 0;
                    return BtStatus::Success;
                }
                BtStatus::Failure => self.current += 1,
            }
        }
        self.current = 0;
        BtStatus::Failure
    }
}

/// Runs children in order while they succeed.
///
/// `Running` and `Failure` stop the sequence and leave `current` on that
/// child, so the next tick resumes there even after a failure. Only running
/// off the end (every child succeeded) resets `current` to 0.
#[derive(Debug)]
pub struct Sequence {
    children: Vec<BoxedNode>,
    current: usize,
}

impl Sequence {
    #[must_use]
    pub fn new(children: Vec<BoxedNode>) -> Self {
        Self {
            children,
            current: 0,
        }
    }

    /// Index of the child the next tick starts from
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn children(&self) -> &[BoxedNode] {
        &self.children
    }
}

impl BtNode for Sequence {
    fn name(&self) -> &'static str {
        "Sequence"
    }

    fn tick(&mut self, world: &mut World, entity: Entity, dt: f32) -> BtStatus {
        while self.current < self.children.len() {
            match self.children[self.current].tick(world, entity, dt) {
                BtStatus::Success => self.current += 1,
                status => return status,
            }
        }
        self.current = 0;
        BtStatus::Success
    }
}

// ============================================================================
// Decorators
// ============================================================================

/// Blocks its child for `cooldown` seconds after each success.
///
/// While the timer counts down the decorator fails without ticking the child.
#[derive(Debug)]
pub struct Cooldown {
    child: BoxedNode,
    cooldown: f32,
    time_left: f32,
}

impl Cooldown {
    #[must_use]
    pub fn new(child: BoxedNode, cooldown: f32) -> Self {
        Self {
            child,
            cooldown,
            time_left: 0.0,
        }
    }

    /// Seconds until the child may run again
    #[must_use]
    pub fn time_left(&self) -> f32 {
        self.time_left
    }
}

impl BtNode for Cooldown {
    fn name(&self) -> &'static str {
        "Cooldown"
    }

    fn tick(&mut self, world: &mut World, entity: Entity, dt: f32) -> BtStatus {
        if self.time_left > 0.0 {
            self.time_left -= dt;
            return BtStatus::Failure;
        }

        let status = self.child.tick(world, entity, dt);
        if status == BtStatus::Success {
            self.time_left = self.cooldown;
        }
        status
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Shorthand for `Box::new(Selector::new(children))`
#[inline]
#[must_use]
pub fn selector(children: Vec<BoxedNode>) -> BoxedNode {
    Box::new(Selector::new(children))
}

/// Shorthand for `Box::new(Sequence::new(children))`
#[inline]
#[must_use]
pub fn sequence(children: Vec<BoxedNode>) -> BoxedNode {
    Box::new(Sequence::new(children))
}

/// Shorthand for `Box::new(Cooldown::new(child, seconds))`
#[inline]
#[must_use]
pub fn cooldown(child: BoxedNode, seconds: f32) -> BoxedNode {
    Box::new(Cooldown::new(child, seconds))
}

// ============================================================================
// Tests
// ============================================================================
