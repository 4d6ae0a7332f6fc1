use serde::{Deserialize, Serialize};

use crate::codec::{IntegerWidth, WidthCodec};
use crate::coords::{Rgb, WorldBounds};

/// Length of the big-endian point-count field that opens every frame.
pub const COUNT_LEN: usize = 4;
/// Length of the big-endian score that follows a zero point count.
pub const SCORE_LEN: usize = 4;
/// Length of an on-wire RGB triple.
pub const RGB_LEN: usize = 3;

// === Server -> Client ===

/// What follows each coordinate group in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointLayout {
    /// `3 * width` bytes per point; colors are not transmitted.
    #[default]
    CoordsOnly,
    /// `3 * width` coordinate bytes followed by an RGB triple.
    CoordsWithColor,
}

impl PointLayout {
    /// Bytes per point for a given width.
    pub fn point_len(self, width: IntegerWidth) -> usize {
        let coords = 3 * width.bytes();
        match self {
            PointLayout::CoordsOnly => coords,
            PointLayout::CoordsWithColor => coords + RGB_LEN,
        }
    }
}

/// Session parameters announced once by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    pub width: IntegerWidth,
    pub bounds: WorldBounds,
    pub background: Rgb,
}

// === Client -> Server ===

/// Single-byte upstream commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    Up,
    Down,
    Right,
    Left,
    Primary,
    Secondary,
    /// Sent for any input without a dedicated command.
    Fallback,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Quit,
        Command::Up,
        Command::Down,
        Command::Right,
        Command::Left,
        Command::Primary,
        Command::Secondary,
        Command::Fallback,
    ];

    pub fn byte(self) -> u8 {
        match self {
            Command::Quit => b'E',
            Command::Up => b'x',
            Command::Down => b'X',
            Command::Right => b'z',
            Command::Left => b'Z',
            Command::Primary => b'y',
            Command::Secondary => b'Y',
            Command::Fallback => b'F',
        }
    }

    /// Decode a command byte; unknown bytes map to `Fallback`.
    pub fn from_byte(b: u8) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.byte() == b)
            .unwrap_or(Command::Fallback)
    }
}

// === Encoding helpers (server side) ===

/// Width indicator, bounds and background color.
pub fn encode_handshake(codec: &WidthCodec, bounds: WorldBounds, background: Rgb) -> Vec<u8> {
    let mut out = vec![codec.width.indicator()];
    for v in bounds.max {
        codec.encode_unsigned(v, &mut out);
    }
    out.extend_from_slice(&background.0);
    out
}

/// A non-empty frame. `colors` is consulted only for `CoordsWithColor`;
/// missing entries are sent as white.
pub fn encode_points(
    codec: &WidthCodec,
    layout: PointLayout,
    coords: &[[u64; 3]],
    colors: &[Rgb],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(COUNT_LEN + coords.len() * layout.point_len(codec.width));
    out.extend_from_slice(&(coords.len() as u32).to_be_bytes());
    for (i, c) in coords.iter().enumerate() {
        for v in c {
            codec.encode_unsigned(*v, &mut out);
        }
        if layout == PointLayout::CoordsWithColor {
            let rgb = colors.get(i).copied().unwrap_or(Rgb::WHITE);
            out.extend_from_slice(&rgb.0);
        }
    }
    out
}

/// The game-over sentinel: zero point count followed by the score.
pub fn encode_game_over(score: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(COUNT_LEN + SCORE_LEN);
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&score.to_be_bytes());
    out
}
