use std::io::{Read, Write};
use std::sync::mpsc::Receiver;
use std::rc::Rc;
use std::time::Duration;

use snek_shared::error::ProtocolResult;
use snek_shared::frame::Session;
use snek_shared::geometry::Shape;
use snek_shared::protocol::Command;
use snek_shared::vec3::Vec3;

use crate::input::{drain, InputEvent};
use crate::scene::{Camera, Renderer, Scene};

/// Pause between frames
const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// How a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    GameOver { score: u32 },
    Quit,
}

pub struct LoopOptions {
    pub tick: Duration,
    /// Static shape drawn behind the snake, if any. Shared by every scene.
    pub backdrop: Option<Rc<Shape>>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            backdrop: None,
        }
    }
}

/// Drive one session to completion: handshake, then per tick give every
/// pending key its own round trip (send the command, read and render a
/// frame). A tick without keys reads one frame. Quit is sent without
/// reading another frame.
pub fn run_client_loop<T: Read + Write, R: Renderer>(
    session: &mut Session<T>,
    input: Option<&Receiver<InputEvent>>,
    renderer: &mut R,
    options: LoopOptions,
) -> ProtocolResult<Outcome> {
    let handshake = session.handshake()?;
    let normalized = session.config().normalize;
    let camera = if normalized {
        Camera::default()
    } else {
        let [x, y, z] = handshake.bounds.max;
        Camera::for_extent(Vec3::new(x as f32, y as f32, z as f32))
    };

    let mut first = true;
    loop {
        if !first {
            std::thread::sleep(options.tick);
        }
        first = false;

        let (keys, mut clicks) = input.map(drain).unwrap_or_default();
        let commands: Vec<Option<Command>> = if keys.is_empty() {
            vec![None]
        } else {
            keys.iter().map(|k| Some(k.command())).collect()
        };

        for command in commands {
            if command == Some(Command::Quit) {
                session.send(Command::Quit)?;
                tracing::info!("Quit requested");
                return Ok(Outcome::Quit);
            }

            let frame = session.tick(command)?;
            let mut scene = Scene::from_frame(&handshake, &frame, normalized);
            scene.backdrop = options.backdrop.clone();

            for (x, y) in clicks.drain(..) {
                match scene.pick(&camera, x, y) {
                    Some(p) => tracing::info!("Picked {:?} at {:?}", p.kind, p.point.to_array()),
                    None => tracing::info!("Nothing under cursor ({}, {})", x, y),
                }
            }

            renderer.render(&scene);

            if let Some(score) = frame.score {
                return Ok(Outcome::GameOver { score });
            }
        }
    }
}
