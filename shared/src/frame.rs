//! Per-connection scene stream parser.
//!
//! A `Session` owns the transport and walks `Init -> Streaming -> Ended`.
//! Reads block until the requested bytes arrive; any protocol error leaves
//! the stream out of sync, so callers drop the session instead of retrying.

use std::io::{ErrorKind, Read, Write};

use crate::codec::{Endianness, IntegerWidth, WidthCodec};
use crate::config::SessionConfig;
use crate::coords::{decode_triple, CoordinateDecoder, Rgb, WorldBounds};
use crate::error::{ProtocolError, ProtocolResult};
use crate::geometry::Point;
use crate::protocol::{Command, Handshake, PointLayout, COUNT_LEN, RGB_LEN, SCORE_LEN};

/// One decode cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Point count as declared on the wire.
    pub point_count: u32,
    /// Point 0 is the food pellet, the rest are body segments.
    pub points: Vec<Point>,
    /// Present only on the game-over frame.
    pub score: Option<u32>,
}

impl Frame {
    pub fn is_game_over(&self) -> bool {
        self.point_count == 0
    }

    pub fn food(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn body(&self) -> &[Point] {
        self.points.get(1..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Streaming(Handshake),
    Ended { score: u32 },
    /// A protocol error left the stream out of sync. Terminal.
    Failed,
}

/// Separate read and write halves presented as one transport.
#[derive(Debug)]
pub struct Duplex<R, W> {
    pub reader: R,
    pub writer: W,
}

impl<R, W> Duplex<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W> Read for Duplex<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R, W: Write> Write for Duplex<R, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

pub struct Session<T> {
    transport: T,
    config: SessionConfig,
    endianness: Endianness,
    state: SessionState,
    decoder: Option<CoordinateDecoder>,
}

impl<T> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            endianness: config.byte_order.resolve(),
            config,
            state: SessionState::Init,
            decoder: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn handshake_info(&self) -> Option<Handshake> {
        match self.state {
            SessionState::Streaming(h) => Some(h),
            _ => None,
        }
    }

    pub fn final_score(&self) -> Option<u32> {
        match self.state {
            SessionState::Ended { score } => Some(score),
            _ => None,
        }
    }

    /// Any error from a read or write is fatal: the session stops accepting
    /// calls instead of decoding out-of-sync bytes.
    fn fail_on_err<V>(&mut self, result: ProtocolResult<V>) -> ProtocolResult<V> {
        if let Err(e) = &result {
            tracing::debug!("Session moved to failed state: {}", e);
            self.state = SessionState::Failed;
            self.decoder = None;
        }
        result
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Read> Session<T> {
    /// Fill `buf` completely. End of stream before any byte is
    /// `TransportClosed`; part way through it is `ShortRead`.
    fn read_full(&mut self, buf: &mut [u8]) -> ProtocolResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.transport.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Err(ProtocolError::TransportClosed),
                Ok(0) => {
                    return Err(ProtocolError::ShortRead {
                        expected: buf.len(),
                        actual: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn read_count(&mut self) -> ProtocolResult<u32> {
        let mut buf = [0u8; COUNT_LEN];
        self.read_full(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Negotiate width, then read world bounds and the background color.
    /// Calling it again once streaming returns the stored handshake.
    pub fn handshake(&mut self) -> ProtocolResult<Handshake> {
        match self.state {
            SessionState::Init => {}
            SessionState::Streaming(h) => return Ok(h),
            SessionState::Ended { score } => return Err(ProtocolError::SessionEnded { score }),
            SessionState::Failed => return Err(ProtocolError::SessionFailed),
        }
        let result = self.read_handshake();
        self.fail_on_err(result)
    }

    fn read_handshake(&mut self) -> ProtocolResult<Handshake> {
        let mut indicator = [0u8; 1];
        self.read_full(&mut indicator)?;
        let width = IntegerWidth::negotiate(indicator[0])?;
        let codec = WidthCodec::new(width, self.endianness);

        let coords_len = 3 * width.bytes();
        let mut meta = vec![0u8; coords_len + RGB_LEN];
        self.read_full(&mut meta)?;
        let [x, y, z] = decode_triple(&codec, &meta[..coords_len])?;
        let bounds = WorldBounds::new(x, y, z);
        let background = Rgb::from_bytes(&meta[coords_len..])?;

        tracing::info!(
            "Negotiated {}-byte coordinates ({:?}), world bounds {:?}, background {:?}",
            width.bytes(),
            self.endianness,
            bounds.max,
            background.0
        );

        let handshake = Handshake {
            width,
            bounds,
            background,
        };
        self.decoder = Some(CoordinateDecoder::new(codec, bounds, self.config.normalize));
        self.state = SessionState::Streaming(handshake);
        Ok(handshake)
    }

    /// Read one frame. A zero point count reads the score, ends the session
    /// and yields an empty frame carrying it.
    pub fn next_frame(&mut self) -> ProtocolResult<Frame> {
        let decoder = match (self.state, self.decoder) {
            (SessionState::Ended { score }, _) => return Err(ProtocolError::SessionEnded { score }),
            (SessionState::Failed, _) => return Err(ProtocolError::SessionFailed),
            (SessionState::Streaming(_), Some(d)) => d,
            _ => return Err(ProtocolError::NotNegotiated),
        };
        let result = self.read_frame(decoder);
        self.fail_on_err(result)
    }

    fn read_frame(&mut self, decoder: CoordinateDecoder) -> ProtocolResult<Frame> {
        let count = self.read_count()?;
        if count == 0 {
            let mut score = [0u8; SCORE_LEN];
            self.read_full(&mut score)?;
            let score = u32::from_be_bytes(score);
            tracing::info!("Game over, final score {}", score);
            self.state = SessionState::Ended { score };
            return Ok(Frame {
                point_count: 0,
                points: Vec::new(),
                score: Some(score),
            });
        }

        if count > self.config.max_points {
            return Err(ProtocolError::TooManyPoints {
                count,
                limit: self.config.max_points,
            });
        }

        let layout = self.config.point_layout;
        let point_len = layout.point_len(decoder.codec.width);
        let mut payload = vec![0u8; count as usize * point_len];
        self.read_full(&mut payload)?;

        let coords_len = decoder.group_len();
        let mut points = Vec::with_capacity(count as usize);
        for chunk in payload.chunks_exact(point_len) {
            let pos = decoder.decode(&chunk[..coords_len])?;
            let color = match layout {
                PointLayout::CoordsOnly => Rgb::WHITE,
                PointLayout::CoordsWithColor => Rgb::from_bytes(&chunk[coords_len..])?,
            };
            points.push(Point::colored(pos.x, pos.y, pos.z, color.to_rgba()));
        }

        tracing::debug!("Frame with {} points", count);
        Ok(Frame {
            point_count: count,
            points,
            score: None,
        })
    }
}

impl<T: Read + Write> Session<T> {
    /// Write one command byte upstream.
    pub fn send(&mut self, command: Command) -> ProtocolResult<()> {
        match self.state {
            SessionState::Ended { score } => return Err(ProtocolError::SessionEnded { score }),
            SessionState::Failed => return Err(ProtocolError::SessionFailed),
            _ => {}
        }
        let result = self.write_command(command);
        self.fail_on_err(result)
    }

    fn write_command(&mut self, command: Command) -> ProtocolResult<()> {
        self.transport.write_all(&[command.byte()])?;
        self.transport.flush()?;
        tracing::trace!("Sent command {:?}", command);
        Ok(())
    }

    /// One protocol round trip: optionally send a command, then read a frame.
    pub fn tick(&mut self, command: Option<Command>) -> ProtocolResult<Frame> {
        if let Some(c) = command {
            self.send(c)?;
        }
        self.next_frame()
    }
}
