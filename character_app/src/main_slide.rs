//! Collide-and-slide demo: one character walks across a field of cubes.

mod demo_scene;

use collision_engine::prelude::*;
use demo_scene::{build_scene, Character};

const FRAME_COUNT: u32 = 240;
const DT: f32 = 1.0 / 60.0;
const GRAVITY: f32 = 9.8;
const OBSTACLE_COUNT: usize = 12;
const SCENE_SEED: u64 = 7;

fn main() -> Result<(), CollisionError> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting collide-and-slide demo");

    let config = CollisionConfig::default();
    let mut coordinator = coordinator_from_config(&config);
    coordinator.init()?;
    coordinator.update(build_scene(OBSTACLE_COUNT, SCENE_SEED))?;

    // Walk diagonally so the character has to slide around cubes in its path
    let mut character = Character::new(Vec3::new(-9.0, 2.0, -1.0));
    let walk = Vec3::new(2.0, 0.0, 0.2);

    let stopwatch = Stopwatch::start_new();
    for frame in 0..FRAME_COUNT {
        character.velocity.y -= GRAVITY * DT;
        let displacement = walk * DT + character.velocity * DT;

        coordinator.collide(CollisionRequest {
            collision_id: u64::from(frame),
            radius: character.ellipsoid,
            position: character.position,
            velocity: displacement,
            maximum_retry: config.default_retry_count,
            excluded_mesh_id: None,
        })?;

        for reply in coordinator.poll_replies()? {
            character.apply_reply(&reply, displacement);
        }

        if frame % 30 == 0 {
            log::info!(
                "frame {:3}: position ({:.2}, {:.2}, {:.2})",
                frame,
                character.position.x,
                character.position.y,
                character.position.z
            );
        }
    }

    log::info!(
        "Resolved {} queries in {:.2} ms, finished at ({:.2}, {:.2}, {:.2})",
        FRAME_COUNT,
        stopwatch.elapsed_millis(),
        character.position.x,
        character.position.y,
        character.position.z
    );
    Ok(())
}
