//! Mode-driven AI controller
//!
//! Reacts to mode changes made from outside (gameplay, tooling) by applying
//! the mode's side-effects to the agent's [`NavAgent`] and rebuilding its
//! behaviour tree, then ticks the tree. Must run before the
//! [`NavAgentSystem`](super::NavAgentSystem) in the same step, because it
//! produces the target/follow/dirty state that system consumes.

use glam::Vec3;
use hecs::Entity;

use super::actions::{build_tree_for_mode, resolve_player};
use super::behavior_tree::BtStatus;
use super::components::{AiComponent, AiMode, NavAgent};
use crate::core::{AgentConfig, AiConfig, EventQueue, NavEvent};
use crate::ecs::World;

/// Applies mode side-effects and ticks per-entity behaviour trees
#[derive(Debug, Default)]
pub struct AiSystem {
    /// Defaults for agents created on demand
    agent_defaults: AgentConfig,
}

impl AiSystem {
    /// Create a system that creates missing agents with `agent_defaults`
    #[must_use]
    pub fn new(agent_defaults: AgentConfig) -> Self {
        Self { agent_defaults }
    }

    /// Attach AI (and a nav agent, if missing) to `entity` and apply its
    /// initial mode straight away. The tree itself is built on the next tick.
    pub fn init_enemy(
        &self,
        world: &mut World,
        entity: Entity,
        patrol_points: Vec<Vec3>,
        config: &AiConfig,
    ) -> bool {
        if !world.contains(entity) {
            return false;
        }
        let mut ai = AiComponent::from_config(config, patrol_points);
        ai.last_mode = Some(ai.mode);
        if world.inner.insert_one(entity, ai).is_err() {
            return false;
        }
        apply_mode_side_effects(world, entity, config.mode, &self.agent_defaults);
        true
    }

    /// Run one AI step for every entity with an [`AiComponent`]
    pub fn update(&mut self, world: &mut World, dt: f32, events: &mut EventQueue) {
        for entity in world.entities_with::<AiComponent>() {
            self.update_entity(world, entity, dt, events);
        }
    }

    fn update_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        dt: f32,
        events: &mut EventQueue,
    ) -> Option<BtStatus> {
        let (mode, previous, needs_rebuild) = {
            let ai = world.get::<AiComponent>(entity).ok()?;
            let changed = ai.last_mode != Some(ai.mode);
            let missing_tree = ai.tree.is_none() && ai.mode != AiMode::Idle;
            (ai.mode, ai.last_mode, changed || missing_tree)
        };

        if needs_rebuild {
            apply_mode_side_effects(world, entity, mode, &self.agent_defaults);
            let mut ai = world.get_mut::<AiComponent>(entity).ok()?;
            ai.tree = build_tree_for_mode(mode);
            ai.last_mode = Some(mode);
            if previous != Some(mode) {
                log::debug!("{entity:?} mode {previous:?} -> {mode:?}");
                events.push(NavEvent::ModeChanged {
                    entity,
                    from: previous,
                    to: mode,
                });
            }
        }

        // The tree is taken out while it runs so leaves can borrow the world freely
        let mut root = world.get_mut::<AiComponent>(entity).ok()?.tree.take()?;
        let status = root.tick(world, entity, dt);
        if let Ok(mut ai) = world.get_mut::<AiComponent>(entity) {
            // A mode change during the tick already scheduled a rebuild
            if ai.tree.is_none() && ai.last_mode == Some(mode) {
                ai.tree = Some(root);
            }
        }
        log::trace!("{entity:?} tree -> {status:?}");
        Some(status)
    }
}

/// Apply the navigation side-effects of entering `mode`.
///
/// Creates the [`NavAgent`] if the entity does not have one yet.
pub fn apply_mode_side_effects(
    world: &mut World,
    entity: Entity,
    mode: AiMode,
    agent_defaults: &AgentConfig,
) {
    if !world.get_or_insert_with(entity, || NavAgent::from_config(agent_defaults)) {
        return;
    }
    let player = match mode {
        AiMode::Seek => resolve_player(world, entity),
        _ => None,
    };

    let Ok((ai, agent)) = world
        .inner
        .query_one_mut::<(&mut AiComponent, &mut NavAgent)>(entity)
    else {
        return;
    };

    match mode {
        AiMode::Idle => {
            agent.follow = None;
            agent.active = false;
            agent.clear_path();
            agent.dirty = false;
            agent.repath_timer = 0.0;
            agent.velocity = Vec3::ZERO;
        }
        AiMode::Patrol => {
            agent.active = true;
            agent.follow = None;
            agent.dirty = true;
            agent.repath_timer = 0.0;

            ai.idle_timer = 0.0;
            if ai.patrol_index >= ai.patrol_points.len() {
                ai.patrol_index = 0;
            }
        }
        AiMode::Seek => {
            agent.active = true;
            if let Some(player) = player {
                agent.follow = Some(player);
            }
            agent.dirty = true;
            agent.repath_timer = 0.0;
        }
        AiMode::Auto => {
            agent.active = true;
        }
    }
}
