//! Headless demo: two enemies patrol a walled map while the player wanders
//! into view, then one is switched to idle.
//!
//! Pass a RON config path as the first argument to override the defaults.
//! Set `RUST_LOG=debug` to watch mode changes and path requests.

use gridnav::prelude::*;

const MAP: &str = "\
....................
.########...#######.
.#..........#.......
.#..####....#..###..
.#.....#.......#....
.#######..######....
....................
...####.....####....
......#.....#.......
....................";

fn load_config() -> Result<SimulationConfig> {
    match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(text) => SimulationConfig::from_ron_str(&text),
            Err(e) => {
                log::warn!("Could not read {path}: {e}; using defaults");
                Ok(SimulationConfig::default())
            }
        },
        None => Ok(SimulationConfig::default()),
    }
}

fn summarize(sim: &Simulation, tally: &mut [usize; 3]) {
    for event in sim.events().iter() {
        match event {
            NavEvent::ModeChanged { entity, from, to } => {
                log::info!("{entity:?}: {from:?} -> {to:?}");
            }
            NavEvent::PathFound { .. } => tally[0] += 1,
            NavEvent::PathFailed { entity, goal } => {
                log::info!("{entity:?}: no path to {goal}");
                tally[1] += 1;
            }
            NavEvent::DestinationReached { .. } => tally[2] += 1,
            _ => {}
        }
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = load_config()?;
    let grid = Grid::from_ascii(MAP, 1.0)?;
    log::info!("Loaded {}x{} map", grid.width, grid.height);

    let mut sim = Simulation::new(config, grid)?;
    let player = sim.spawn_player(Vec3::new(19.0, 0.0, 9.0));

    let guard = sim.spawn_enemy(
        Vec3::new(2.0, 0.0, 2.0),
        vec![
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(10.0, 0.0, 2.0),
            Vec3::new(10.0, 0.0, 4.0),
            Vec3::new(2.0, 0.0, 4.0),
        ],
    );
    sim.world_mut()
        .inner
        .insert_one(guard, Vision::new(10.0, 120.0))?;
    let rover = sim.spawn_enemy(
        Vec3::new(0.0, 0.0, 6.0),
        vec![Vec3::new(0.0, 0.0, 6.0), Vec3::new(18.0, 0.0, 6.0)],
    );
    sim.set_flow_target(Some(player));

    let steps_per_second = (1.0 / sim.config().fixed_dt).round().max(1.0) as u32;
    let mut tally = [0usize; 3];

    for second in 0..20 {
        // Player walks toward the rover's patrol line after a few seconds
        if second == 5 {
            if let Ok(mut transform) = sim.world_mut().get_mut::<Transform>(player) {
                transform.position = Vec3::new(12.0, 0.0, 6.0);
            }
        }
        if second == 14 {
            sim.set_mode(rover, AiMode::Idle);
        }

        for _ in 0..steps_per_second {
            sim.step();
            summarize(&sim, &mut tally);
        }

        let guard_pos = sim.world().position_of(guard).unwrap_or_default();
        let rover_pos = sim.world().position_of(rover).unwrap_or_default();
        let guard_sees = sim
            .world()
            .get::<Vision>(guard)
            .map(|v| v.has_los)
            .unwrap_or(false);
        log::info!(
            "t={:>4.1}s guard {guard_pos} (sees player: {guard_sees}) rover {rover_pos}",
            sim.elapsed()
        );
    }
    sim.flush_events();
    summarize(&sim, &mut tally);

    log::info!(
        "{} paths planned, {} failed, {} destinations reached",
        tally[0],
        tally[1],
        tally[2]
    );
    log::info!("{}", sim.stats().format_stats());
    Ok(())
}
