//! Perception conditions and action leaves for enemy agents
//!
//! Leaves talk to the rest of the simulation only through components: they
//! read [`Transform`] and [`AiComponent`], and express intent by writing the
//! target/follow/dirty fields of [`NavAgent`]. Missing components, an
//! unresolvable player or an empty patrol loop all surface as
//! [`BtStatus::Failure`] so the tree can fall back to another branch.
//!
//! Agents that carry a [`Vision`] detect by sight instead of by radius, and
//! keep chasing toward the last sighting until the target counts as lost.

use hecs::Entity;

use super::behavior_tree::{BoxedNode, BtNode, BtStatus, cooldown, selector, sequence};
use super::components::{AiComponent, AiMode, NavAgent};
use super::vision::Vision;
use crate::ecs::{Transform, World};

/// Return the cached player if still valid, otherwise look it up by name and cache the result
pub fn resolve_player(world: &mut World, entity: Entity) -> Option<Entity> {
    let name = {
        let ai = world.get::<AiComponent>(entity).ok()?;
        if world.is_valid_target(ai.player) {
            return ai.player;
        }
        ai.player_name.clone()
    };

    let found = world
        .find_by_name(&name)
        .filter(|&player| player != entity && world.has::<Transform>(player));
    if let Ok(mut ai) = world.get_mut::<AiComponent>(entity) {
        ai.player = found;
    }
    if let Some(player) = found {
        log::debug!("{entity:?} resolved player {name:?} to {player:?}");
    }
    found
}

/// Squared distance from the agent to its resolved player
fn player_distance_sq(world: &mut World, entity: Entity) -> Option<f32> {
    let player = resolve_player(world, entity)?;
    let me = world.position_of(entity)?;
    let them = world.position_of(player)?;
    Some(me.distance_squared(them))
}

/// Succeeds while the player is inside the detect radius, or, for agents
/// with a [`Vision`], while the player is in sight
#[derive(Debug, Default)]
pub struct SeePlayerCond;

impl BtNode for SeePlayerCond {
    fn name(&self) -> &'static str {
        "SeePlayer"
    }

    fn tick(&mut self, world: &mut World, entity: Entity, _dt: f32) -> BtStatus {
        let Some(d2) = player_distance_sq(world, entity) else {
            return BtStatus::Failure;
        };
        if let Ok(vision) = world.get::<Vision>(entity) {
            return if vision.has_los {
                BtStatus::Success
            } else {
                BtStatus::Failure
            };
        }
        let Ok(ai) = world.get::<AiComponent>(entity) else {
            return BtStatus::Failure;
        };
        if d2 <= ai.detect_radius * ai.detect_radius {
            BtStatus::Success
        } else {
            BtStatus::Failure
        }
    }
}

/// Succeeds while the player is inside the lose radius.
///
/// The lose radius is normally larger than the detect radius so a chase
/// does not flicker on and off at the detection boundary.
#[derive(Debug, Default)]
pub struct StillChasingCond;

impl BtNode for StillChasingCond {
    fn name(&self) -> &'static str {
        "StillChasing"
    }

    fn tick(&mut self, world: &mut World, entity: Entity, _dt: f32) -> BtStatus {
        let Some(d2) = player_distance_sq(world, entity) else {
            return BtStatus::Failure;
        };
        let Ok(ai) = world.get::<AiComponent>(entity) else {
            return BtStatus::Failure;
        };
        if d2 <= ai.lose_radius * ai.lose_radius {
            BtStatus::Success
        } else {
            BtStatus::Failure
        }
    }
}

/// Walks to the current patrol point.
///
/// Running while en route; on arrival advances the patrol index (wrapping),
/// arms the idle countdown and succeeds.
#[derive(Debug, Default)]
pub struct PatrolAction;

impl BtNode for PatrolAction {
    fn name(&self) -> &'static str {
        "Patrol"
    }

    fn tick(&mut self, world: &mut World, entity: Entity, _dt: f32) -> BtStatus {
        let Ok((transform, ai, agent)) = world
            .inner
            .query_one_mut::<(&Transform, &mut AiComponent, &mut NavAgent)>(entity)
        else {
            return BtStatus::Failure;
        };

        if ai.patrol_points.is_empty() {
            return BtStatus::Failure;
        }
        if ai.patrol_index >= ai.patrol_points.len() {
            ai.patrol_index = 0;
        }

        let goal = ai.patrol_points[ai.patrol_index];
        agent.set_target(goal);

        if transform.position.distance(goal) <= agent.arrive_radius {
            ai.patrol_index = (ai.patrol_index + 1) % ai.patrol_points.len();
            ai.idle_timer = ai.idle_wait;
            log::debug!("{entity:?} reached patrol point, next is #{}", ai.patrol_index);
            return BtStatus::Success;
        }
        BtStatus::Running
    }
}

/// Points the agent's follow reference at the player.
///
/// Never succeeds on its own: it keeps running for as long as the player
/// reference stays valid. An agent with a [`Vision`] follows only while the
/// player is in sight; out of sight it walks to the last sighting, and fails
/// once the player counts as lost.
#[derive(Debug, Default)]
pub struct SeekPlayerAction;

impl BtNode for SeekPlayerAction {
    fn name(&self) -> &'static str {
        "SeekPlayer"
    }

    fn tick(&mut self, world: &mut World, entity: Entity, _dt: f32) -> BtStatus {
        let Some(player) = resolve_player(world, entity) else {
            return BtStatus::Failure;
        };
        let sight = world
            .get::<Vision>(entity)
            .ok()
            .map(|vision| (vision.has_los, vision.is_lost(), vision.last_seen_pos));
        let Ok(mut agent) = world.get_mut::<NavAgent>(entity) else {
            return BtStatus::Failure;
        };

        match sight {
            Some((false, true, _)) => {
                if agent.follow.take().is_some() {
                    log::debug!("{entity:?} lost {player:?}");
                }
                return BtStatus::Failure;
            }
            Some((false, false, last_seen)) => {
                let was_following = agent.follow.take().is_some();
                if agent.set_target(last_seen) || was_following {
                    log::debug!("{entity:?} searching last sighting at {last_seen}");
                }
                return BtStatus::Running;
            }
            _ => {}
        }

        if agent.set_follow(player) {
            log::debug!("{entity:?} now following {player:?}");
        }
        BtStatus::Running
    }
}

/// Counts down the idle timer armed by [`PatrolAction`]
#[derive(Debug, Default)]
pub struct IdleAction;

impl BtNode for IdleAction {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn tick(&mut self, world: &mut World, entity: Entity, dt: f32) -> BtStatus {
        let Ok(mut ai) = world.get_mut::<AiComponent>(entity) else {
            return BtStatus::Failure;
        };
        ai.idle_timer -= dt;
        if ai.idle_timer <= 0.0 {
            BtStatus::Success
        } else {
            BtStatus::Running
        }
    }
}

/// `[SeePlayer, SeekPlayer, StillChasing]`
#[must_use]
pub fn chase_branch() -> BoxedNode {
    sequence(vec![
        Box::new(SeePlayerCond),
        Box::new(SeekPlayerAction),
        Box::new(StillChasingCond),
    ])
}

/// `[Patrol, Cooldown(Idle, 0)]`
///
/// The zero-length cooldown never gates anything, so idling always starts
/// right after a patrol point is reached.
#[must_use]
pub fn patrol_branch() -> BoxedNode {
    sequence(vec![
        Box::new(PatrolAction),
        cooldown(Box::new(IdleAction), 0.0),
    ])
}

/// Chase if the player is visible, otherwise patrol
#[must_use]
pub fn build_patrol_seek_tree() -> BoxedNode {
    selector(vec![chase_branch(), patrol_branch()])
}

/// Tree for a mode.
///
/// Every ticking mode gets the same chase-or-patrol tree; modes only differ
/// in the side-effects applied on entry. `Idle` has no tree.
#[must_use]
pub fn build_tree_for_mode(mode: AiMode) -> Option<BoxedNode> {
    match mode {
        AiMode::Auto | AiMode::Patrol | AiMode::Seek => Some(build_patrol_seek_tree()),
        AiMode::Idle => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Name;
    use glam::Vec3;

    struct Scene {
        world: World,
        enemy: Entity,
        player: Entity,
    }

    fn scene(player_at: Vec3) -> Scene {
        let mut world = World::new();
        let player = world.spawn((Name::new("Player"), Transform::from_position(player_at)));
        let ai = AiComponent {
            detect_radius: 5.0,
            lose_radius: 8.0,
            idle_wait: 0.5,
            patrol_points: vec![Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 3.0)],
            ..Default::default()
        };
        let enemy = world.spawn((
            Name::new("Enemy"),
            Transform::from_position(Vec3::ZERO),
            ai,
            NavAgent::default(),
        ));
        Scene {
            world,
            enemy,
            player,
        }
    }

    #[test]
    fn test_see_player_resolves_and_caches() {
        let mut s = scene(Vec3::new(4.0, 0.0, 0.0));

        assert_eq!(SeePlayerCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Success);
        assert_eq!(
            s.world.get::<AiComponent>(s.enemy).unwrap().player,
            Some(s.player)
        );
    }

    #[test]
    fn test_see_player_outside_detect_radius() {
        let mut s = scene(Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(SeePlayerCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);
        // Inside the lose radius though
        assert_eq!(StillChasingCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Success);
    }

    #[test]
    fn test_still_chasing_outside_lose_radius() {
        let mut s = scene(Vec3::new(9.0, 0.0, 0.0));
        assert_eq!(StillChasingCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);
    }

    #[test]
    fn test_missing_player_fails() {
        let mut s = scene(Vec3::X);
        s.world.get_mut::<AiComponent>(s.enemy).unwrap().player_name = "Nobody".into();

        assert_eq!(SeePlayerCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);
        assert_eq!(StillChasingCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);
        assert_eq!(SeekPlayerAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);
    }

    #[test]
    fn test_destroyed_player_is_re_resolved_or_fails() {
        let mut s = scene(Vec3::X);
        assert_eq!(SeePlayerCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Success);

        s.world.despawn(s.player).unwrap();
        assert_eq!(SeePlayerCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);
        assert_eq!(s.world.get::<AiComponent>(s.enemy).unwrap().player, None);

        let replacement = s
            .world
            .spawn((Name::new("Player"), Transform::from_position(Vec3::Z)));
        assert_eq!(SeePlayerCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Success);
        assert_eq!(
            s.world.get::<AiComponent>(s.enemy).unwrap().player,
            Some(replacement)
        );
    }

    #[test]
    fn test_seek_wires_follow_and_keeps_running() {
        let mut s = scene(Vec3::X);

        assert_eq!(SeekPlayerAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        {
            let agent = s.world.get::<NavAgent>(s.enemy).unwrap();
            assert_eq!(agent.follow, Some(s.player));
            assert!(agent.dirty);
        }

        s.world.get_mut::<NavAgent>(s.enemy).unwrap().dirty = false;
        assert_eq!(SeekPlayerAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        assert!(!s.world.get::<NavAgent>(s.enemy).unwrap().dirty);
    }

    #[test]
    fn test_patrol_sets_target_then_succeeds_on_arrival() {
        let mut s = scene(Vec3::new(50.0, 0.0, 0.0));

        assert_eq!(PatrolAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        {
            let agent = s.world.get::<NavAgent>(s.enemy).unwrap();
            assert_eq!(agent.target, Vec3::new(3.0, 0.0, 0.0));
            assert!(agent.dirty);
        }

        // Same goal again: no new dirty mark
        s.world.get_mut::<NavAgent>(s.enemy).unwrap().dirty = false;
        assert_eq!(PatrolAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        assert!(!s.world.get::<NavAgent>(s.enemy).unwrap().dirty);

        s.world.get_mut::<Transform>(s.enemy).unwrap().position = Vec3::new(3.0, 0.0, 0.1);
        assert_eq!(PatrolAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Success);
        let ai = s.world.get::<AiComponent>(s.enemy).unwrap();
        assert_eq!(ai.patrol_index, 1);
        assert!((ai.idle_timer - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_patrol_index_wraps() {
        let mut s = scene(Vec3::new(50.0, 0.0, 0.0));
        {
            let mut ai = s.world.get_mut::<AiComponent>(s.enemy).unwrap();
            ai.patrol_index = 1;
        }
        s.world.get_mut::<Transform>(s.enemy).unwrap().position = Vec3::new(3.0, 0.0, 3.0);

        assert_eq!(PatrolAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Success);
        assert_eq!(s.world.get::<AiComponent>(s.enemy).unwrap().patrol_index, 0);
    }

    #[test]
    fn test_patrol_without_points_fails() {
        let mut s = scene(Vec3::X);
        s.world
            .get_mut::<AiComponent>(s.enemy)
            .unwrap()
            .patrol_points
            .clear();
        assert_eq!(PatrolAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);
    }

    #[test]
    fn test_idle_counts_down() {
        let mut s = scene(Vec3::X);
        s.world.get_mut::<AiComponent>(s.enemy).unwrap().idle_timer = 0.25;

        assert_eq!(IdleAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        assert_eq!(IdleAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        assert_eq!(IdleAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Success);
    }

    #[test]
    fn test_auto_tree_prefers_chase() {
        let mut s = scene(Vec3::new(2.0, 0.0, 0.0));
        let mut tree = build_patrol_seek_tree();

        assert_eq!(tree.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        assert_eq!(
            s.world.get::<NavAgent>(s.enemy).unwrap().follow,
            Some(s.player)
        );
    }

    #[test]
    fn test_auto_tree_falls_back_to_patrol() {
        let mut s = scene(Vec3::new(40.0, 0.0, 0.0));
        let mut tree = build_patrol_seek_tree();

        assert_eq!(tree.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        let agent = s.world.get::<NavAgent>(s.enemy).unwrap();
        assert_eq!(agent.follow, None);
        assert_eq!(agent.target, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_tree_per_mode() {
        assert!(build_tree_for_mode(AiMode::Idle).is_none());
        for mode in [AiMode::Auto, AiMode::Patrol, AiMode::Seek] {
            let tree = build_tree_for_mode(mode).unwrap();
            assert_eq!(tree.name(), "Selector", "{mode:?}");
        }
    }

    #[test]
    fn test_patrol_and_seek_trees_chase_nearby_player() {
        for mode in [AiMode::Patrol, AiMode::Seek] {
            let mut s = scene(Vec3::new(2.0, 0.0, 0.0));
            let mut tree = build_tree_for_mode(mode).unwrap();

            assert_eq!(tree.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
            assert_eq!(
                s.world.get::<NavAgent>(s.enemy).unwrap().follow,
                Some(s.player),
                "{mode:?}"
            );
        }
    }

    #[test]
    fn test_seek_tree_patrols_when_player_is_far() {
        let mut s = scene(Vec3::new(40.0, 0.0, 0.0));
        let mut tree = build_tree_for_mode(AiMode::Seek).unwrap();

        assert_eq!(tree.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        let agent = s.world.get::<NavAgent>(s.enemy).unwrap();
        assert_eq!(agent.follow, None);
        assert_eq!(agent.target, Vec3::new(3.0, 0.0, 0.0));
    }

    fn give_vision(s: &mut Scene, vision: Vision) {
        s.world.inner.insert_one(s.enemy, vision).unwrap();
    }

    #[test]
    fn test_vision_replaces_detect_radius() {
        // Close, but not in sight
        let mut s = scene(Vec3::new(2.0, 0.0, 0.0));
        give_vision(&mut s, Vision::new(10.0, 360.0));
        assert_eq!(SeePlayerCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);

        // Beyond the detect radius, but in sight
        let mut s = scene(Vec3::new(7.0, 0.0, 0.0));
        give_vision(
            &mut s,
            Vision {
                has_los: true,
                ..Vision::new(10.0, 360.0)
            },
        );
        assert_eq!(SeePlayerCond.tick(&mut s.world, s.enemy, 0.1), BtStatus::Success);
    }

    #[test]
    fn test_seek_walks_to_last_sighting_then_gives_up() {
        let mut s = scene(Vec3::new(4.0, 0.0, 0.0));
        give_vision(
            &mut s,
            Vision {
                has_los: true,
                ..Vision::new(10.0, 360.0)
            },
        );

        assert_eq!(SeekPlayerAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        assert_eq!(
            s.world.get::<NavAgent>(s.enemy).unwrap().follow,
            Some(s.player)
        );

        // Sight broken: head for where the player was last seen
        {
            let mut vision = s.world.get_mut::<Vision>(s.enemy).unwrap();
            vision.has_los = false;
            vision.last_seen_pos = Vec3::new(3.0, 0.0, 1.0);
            vision.last_seen_timer = 0.2;
        }
        assert_eq!(SeekPlayerAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Running);
        {
            let agent = s.world.get::<NavAgent>(s.enemy).unwrap();
            assert_eq!(agent.follow, None);
            assert_eq!(agent.target, Vec3::new(3.0, 0.0, 1.0));
            assert!(agent.dirty);
        }

        // Out of sight for too long
        s.world.get_mut::<Vision>(s.enemy).unwrap().last_seen_timer = 5.0;
        assert_eq!(SeekPlayerAction.tick(&mut s.world, s.enemy, 0.1), BtStatus::Failure);
        assert_eq!(s.world.get::<NavAgent>(s.enemy).unwrap().follow, None);
    }
}
