//! Snake scene client.
//!
//! Connects to a scene server over a byte-stream transport, decodes frames
//! with `snek_shared`, and renders them headlessly.

pub mod client_loop;
pub mod config;
pub mod input;
pub mod scene;
pub mod transport;
