//! Coordinate and color decoding on top of the negotiated width.

use crate::codec::WidthCodec;
use crate::error::{ProtocolError, ProtocolResult};
use crate::vec3::Vec3;

const AXES: [char; 3] = ['x', 'y', 'z'];

/// Per-axis maxima announced once at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorldBounds {
    pub max: [u64; 3],
}

impl WorldBounds {
    pub fn new(x: u64, y: u64, z: u64) -> Self {
        Self { max: [x, y, z] }
    }

    /// Divisor used for an axis. A zero bound divides by 1.
    #[inline]
    pub fn divisor(&self, axis: usize) -> u64 {
        self.max[axis].max(1)
    }
}

/// Opaque RGB triple as sent on the wire, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([0xFF, 0xFF, 0xFF]);

    pub fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        match bytes {
            [r, g, b] => Ok(Rgb([*r, *g, *b])),
            _ => Err(ProtocolError::ShortRead {
                expected: 3,
                actual: bytes.len(),
            }),
        }
    }

    /// Channels scaled to [0, 1] with full alpha.
    pub fn to_rgba(self) -> [f32; 4] {
        let [r, g, b] = self.0;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }
}

/// Decode three consecutive width-encoded integers.
pub fn decode_triple(codec: &WidthCodec, bytes: &[u8]) -> ProtocolResult<[u64; 3]> {
    let w = codec.width.bytes();
    if bytes.len() != 3 * w {
        return Err(ProtocolError::ShortRead {
            expected: 3 * w,
            actual: bytes.len(),
        });
    }
    Ok([
        codec.decode_unsigned(&bytes[..w])?,
        codec.decode_unsigned(&bytes[w..2 * w])?,
        codec.decode_unsigned(&bytes[2 * w..])?,
    ])
}

/// Turns raw coordinate groups into positions, normalized by the world
/// bounds unless configured to keep raw values.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateDecoder {
    pub codec: WidthCodec,
    pub bounds: WorldBounds,
    pub normalize: bool,
}

impl CoordinateDecoder {
    pub fn new(codec: WidthCodec, bounds: WorldBounds, normalize: bool) -> Self {
        Self {
            codec,
            bounds,
            normalize,
        }
    }

    /// Bytes per coordinate group.
    #[inline]
    pub fn group_len(&self) -> usize {
        3 * self.codec.width.bytes()
    }

    /// Decode one `3 * width` window.
    ///
    /// A value above its axis bound is rejected. With a zero bound the axis
    /// accepts 0 and 1 only, since it divides by 1.
    pub fn decode(&self, bytes: &[u8]) -> ProtocolResult<Vec3> {
        let raw = decode_triple(&self.codec, bytes)?;
        let mut out = [0.0f32; 3];
        for axis in 0..3 {
            let divisor = self.bounds.divisor(axis);
            if raw[axis] > divisor {
                return Err(ProtocolError::CoordinateOutOfRange {
                    axis: AXES[axis],
                    value: raw[axis],
                    bound: self.bounds.max[axis],
                });
            }
            out[axis] = if self.normalize {
                (raw[axis] as f64 / divisor as f64) as f32
            } else {
                raw[axis] as f32
            };
        }
        Ok(Vec3::from(out))
    }

    /// Decode back-to-back coordinate groups until the payload is used up.
    /// A trailing partial group is a short read.
    pub fn decode_run(&self, payload: &[u8]) -> ProtocolResult<Vec<Vec3>> {
        let group = self.group_len();
        let chunks = payload.chunks_exact(group);
        let rest = chunks.remainder().len();
        if rest != 0 {
            return Err(ProtocolError::ShortRead {
                expected: group,
                actual: rest,
            });
        }
        chunks.map(|c| self.decode(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Endianness, IntegerWidth};

    fn be32() -> WidthCodec {
        WidthCodec::new(IntegerWidth::Four, Endianness::Big)
    }

    fn group(codec: &WidthCodec, vals: [u64; 3]) -> Vec<u8> {
        let mut buf = Vec::new();
        for v in vals {
            codec.encode_unsigned(v, &mut buf);
        }
        buf
    }

    #[test]
    fn normalizes_by_bounds() {
        let dec = CoordinateDecoder::new(be32(), WorldBounds::new(100, 200, 50), true);
        let p = dec.decode(&group(&dec.codec, [50, 50, 50])).unwrap();
        assert!((p.x - 0.5).abs() < 1e-6);
        assert!((p.y - 0.25).abs() < 1e-6);
        assert!((p.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn raw_mode_keeps_integers() {
        let dec = CoordinateDecoder::new(be32(), WorldBounds::new(100, 100, 100), false);
        let p = dec.decode(&group(&dec.codec, [7, 0, 100])).unwrap();
        assert_eq!(p, Vec3::new(7.0, 0.0, 100.0));
    }

    #[test]
    fn zero_bound_divides_by_one() {
        let dec = CoordinateDecoder::new(be32(), WorldBounds::new(0, 10, 10), true);
        let p = dec.decode(&group(&dec.codec, [1, 5, 0])).unwrap();
        assert_eq!(p.x, 1.0);
        assert!(p.is_finite());
    }

    #[test]
    fn value_above_bound_is_rejected() {
        let dec = CoordinateDecoder::new(be32(), WorldBounds::new(10, 10, 10), true);
        assert_eq!(
            dec.decode(&group(&dec.codec, [3, 11, 3])),
            Err(ProtocolError::CoordinateOutOfRange {
                axis: 'y',
                value: 11,
                bound: 10
            })
        );
    }

    #[test]
    fn wrong_window_length_is_short_read() {
        let dec = CoordinateDecoder::new(be32(), WorldBounds::new(10, 10, 10), true);
        assert_eq!(
            dec.decode(&[0u8; 11]),
            Err(ProtocolError::ShortRead {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn decode_run_consumes_whole_payload() {
        let codec = WidthCodec::new(IntegerWidth::One, Endianness::Little);
        let dec = CoordinateDecoder::new(codec, WorldBounds::new(10, 10, 10), true);
        let pts = dec.decode_run(&[5, 5, 5, 1, 2, 3]).unwrap();
        assert_eq!(pts.len(), 2);
        assert!((pts[1].z - 0.3).abs() < 1e-6);
        assert!(dec.decode_run(&[5, 5, 5, 1]).is_err());
    }

    #[test]
    fn rgb_scales_to_unit_range() {
        assert_eq!(Rgb::WHITE.to_rgba(), [1.0, 1.0, 1.0, 1.0]);
        let c = Rgb::from_bytes(&[0, 51, 255]).unwrap().to_rgba();
        assert!((c[1] - 0.2).abs() < 1e-6);
        assert!(Rgb::from_bytes(&[1, 2]).is_err());
    }
}
