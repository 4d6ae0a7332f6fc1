use std::io::BufReader;
use std::rc::Rc;

use snek_client::client_loop::{run_client_loop, LoopOptions, Outcome};
use snek_client::config::ClientConfig;
use snek_client::input::spawn_reader;
use snek_client::scene::LogRenderer;
use snek_client::transport::Transport;
use snek_shared::frame::Session;
use snek_shared::pointcloud;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match ClientConfig::from_env_and_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid client configuration: {}", e);
            std::process::exit(1);
        }
    };

    let backdrop = match &config.cloud {
        Some(path) => match pointcloud::load_file(path) {
            Ok(shape) => Some(Rc::new(shape)),
            Err(e) => {
                eprintln!("Invalid point cloud: {}", e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let transport = match Transport::connect(&config.address) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Keys come from stdin unless the scene stream already does.
    let input = if config.address.uses_stdin() {
        None
    } else {
        Some(spawn_reader(BufReader::new(std::io::stdin())))
    };

    let mut session = Session::new(transport, config.session);
    let mut renderer = LogRenderer::default();
    let options = LoopOptions {
        tick: config.tick(),
        backdrop,
    };

    match run_client_loop(&mut session, input.as_ref(), &mut renderer, options) {
        // Stdout may be the command stream; the result only goes to the log.
        Ok(Outcome::GameOver { score }) => tracing::info!("Final score: {}", score),
        Ok(Outcome::Quit) => tracing::info!("Bye"),
        Err(e) => {
            tracing::error!("Session failed: {}", e);
            std::process::exit(1);
        }
    }
}
