use crate::codec::Endianness;
use crate::protocol::PointLayout;

/// Which byte order width-encoded payload fields use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ByteOrder {
    /// Probe the host once at startup; both ends share a machine convention.
    #[default]
    Native,
    Little,
    Big,
}

impl ByteOrder {
    pub fn resolve(self) -> Endianness {
        match self {
            ByteOrder::Native => Endianness::native(),
            ByteOrder::Little => Endianness::Little,
            ByteOrder::Big => Endianness::Big,
        }
    }
}

/// Decoding options for one scene session
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub point_layout: PointLayout,
    /// Divide coordinates by the world bounds; otherwise keep raw integers.
    pub normalize: bool,
    pub byte_order: ByteOrder,
    /// Largest point count accepted in a single frame
    pub max_points: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            point_layout: PointLayout::CoordsOnly,
            normalize: true,
            byte_order: ByteOrder::Native,
            max_points: 1_000_000,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_points == 0 {
            return Err("max_points must be > 0".to_string());
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        let config: SessionConfig =
            serde_json::from_str(text).map_err(|e| format!("invalid session config: {e}"))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_max_points_invalid() {
        let config = SessionConfig {
            max_points: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SessionConfig::from_json(r#"{"pointLayout":"coordsWithColor","byteOrder":"big"}"#)
            .unwrap();
        assert_eq!(config.point_layout, PointLayout::CoordsWithColor);
        assert_eq!(config.byte_order.resolve(), Endianness::Big);
        assert!(config.normalize);
        assert_eq!(config.max_points, 1_000_000);
    }

    #[test]
    fn bad_json_is_rejected() {
        assert!(SessionConfig::from_json("{\"normalize\": 3}").is_err());
        assert!(SessionConfig::from_json("{\"maxPoints\": 0}").is_err());
    }
}
