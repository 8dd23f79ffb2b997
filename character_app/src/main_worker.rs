//! Background-worker demo: several characters resolve queries off-thread.
//!
//! Each frame submits one query per character, tagged with a correlation
//! id that packs the character index into the high bits. Replies are
//! polled every frame and routed back by that id, so resolution overlaps
//! with the rest of the frame's work.

mod demo_scene;

use std::thread;
use std::time::{Duration, Instant};

use collision_engine::prelude::*;
use demo_scene::{build_scene, Character};

const FRAME_COUNT: u32 = 180;
const DT: f32 = 1.0 / 60.0;
const GRAVITY: f32 = 9.8;
const OBSTACLE_COUNT: usize = 16;
const SCENE_SEED: u64 = 42;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

fn tag(index: usize, frame: u32) -> u64 {
    ((index as u64) << 32) | u64::from(frame)
}

fn character_index(collision_id: u64) -> usize {
    (collision_id >> 32) as usize
}

fn main() -> Result<(), CollisionError> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting background worker demo");

    let config = CollisionConfig {
        use_worker: true,
        ..Default::default()
    };
    let mut coordinator = coordinator_from_config(&config);
    coordinator.init()?;
    coordinator.update(build_scene(OBSTACLE_COUNT, SCENE_SEED))?;

    let mut characters = vec![
        Character::new(Vec3::new(-8.0, 2.0, -4.0)),
        Character::new(Vec3::new(-8.0, 2.0, 0.0)),
        Character::new(Vec3::new(-8.0, 2.0, 4.0)),
    ];
    let walks = [
        Vec3::new(1.5, 0.0, 0.3),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(1.5, 0.0, -0.3),
    ];
    let mut requested = vec![Vec3::zeros(); characters.len()];
    let mut in_flight = 0usize;

    let mut timer = Timer::new();
    for frame in 0..FRAME_COUNT {
        for (index, character) in characters.iter_mut().enumerate() {
            character.velocity.y -= GRAVITY * DT;
            let displacement = walks[index] * DT + character.velocity * DT;
            requested[index] = displacement;

            coordinator.collide(CollisionRequest {
                collision_id: tag(index, frame),
                radius: character.ellipsoid,
                position: character.position,
                velocity: displacement,
                maximum_retry: config.default_retry_count,
                excluded_mesh_id: None,
            })?;
            in_flight += 1;
        }

        // Stand in for the rest of the frame while the worker resolves
        thread::sleep(Duration::from_millis(2));

        for reply in coordinator.poll_replies()? {
            let index = character_index(reply.collision_id);
            characters[index].apply_reply(&reply, requested[index]);
            in_flight -= 1;
        }

        timer.update();
        if frame % 30 == 0 {
            for (index, character) in characters.iter().enumerate() {
                log::info!(
                    "frame {:3} character {}: ({:.2}, {:.2}, {:.2})",
                    frame,
                    index,
                    character.position.x,
                    character.position.y,
                    character.position.z
                );
            }
        }
    }

    // Collect whatever is still in flight before shutting the worker down
    let deadline = Instant::now() + DRAIN_TIMEOUT;
    while in_flight > 0 && Instant::now() < deadline {
        for reply in coordinator.poll_replies()? {
            let index = character_index(reply.collision_id);
            characters[index].apply_reply(&reply, requested[index]);
            in_flight -= 1;
        }
        thread::sleep(Duration::from_millis(1));
    }

    log::info!(
        "Simulated {} frames at {:.0} fps average",
        FRAME_COUNT,
        timer.average_fps()
    );
    for (index, character) in characters.iter().enumerate() {
        log::info!(
            "character {} finished at ({:.2}, {:.2}, {:.2})",
            index,
            character.position.x,
            character.position.y,
            character.position.z
        );
    }
    Ok(())
}
