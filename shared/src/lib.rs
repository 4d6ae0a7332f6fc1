//! Snake scene protocol and geometry kernel.
//!
//! The protocol half decodes the server's binary scene stream: width
//! negotiation, world bounds, point frames and the game-over sentinel.
//! The geometry half triangulates shapes and answers ray and
//! point-in-polygon queries against them.

pub mod codec;
pub mod collision;
pub mod config;
pub mod coords;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod mat4;
pub mod pointcloud;
pub mod protocol;
pub mod vec3;

pub use error::{GeometryError, ProtocolError, ProtocolResult};
pub use frame::{Duplex, Frame, Session, SessionState};
pub use protocol::{Command, Handshake, PointLayout};
