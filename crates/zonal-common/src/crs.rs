//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An EPSG-coded coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// WGS84 geographic (lon/lat in degrees).
    pub const WGS84: Crs = Crs { epsg: 4326 };
    /// Web Mercator (meters).
    pub const WEB_MERCATOR: Crs = Crs { epsg: 3857 };
    /// NAD83 / Alaska Albers (meters).
    pub const ALASKA_ALBERS: Crs = Crs { epsg: 3338 };

    pub fn from_epsg(epsg: u16) -> Self {
        Self { epsg }
    }

    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    /// Parse a CRS identifier as found in coverage descriptions and requests.
    ///
    /// Accepts formats like:
    /// - "EPSG:3338" / "epsg:3338"
    /// - "CRS:84" (equivalent to EPSG:4326)
    /// - "http://www.opengis.net/def/crs/EPSG/0/3338"
    /// - "urn:ogc:def:crs:EPSG::3338"
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let trimmed = s.trim();
        let normalized = trimmed.to_uppercase();

        if normalized == "CRS:84" || normalized.ends_with("/OGC/1.3/CRS84") {
            return Ok(Self::WGS84);
        }

        let code = if let Some(rest) = normalized.strip_prefix("EPSG:") {
            rest
        } else if normalized.contains("/EPSG/") || normalized.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            normalized.rsplit(['/', ':']).next().unwrap_or("")
        } else {
            return Err(CrsParseError::UnsupportedCrs(trimmed.to_string()));
        };

        code.trim()
            .parse::<u16>()
            .map(Self::from_epsg)
            .map_err(|_| CrsParseError::InvalidCode(trimmed.to_string()))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid EPSG code in CRS: {0}")]
    InvalidCode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(Crs::parse("EPSG:4326").unwrap(), Crs::WGS84);
        assert_eq!(Crs::parse("epsg:3857").unwrap(), Crs::WEB_MERCATOR);
        assert_eq!(Crs::parse("CRS:84").unwrap(), Crs::WGS84);
        assert_eq!(
            Crs::parse("http://www.opengis.net/def/crs/EPSG/0/3338").unwrap(),
            Crs::ALASKA_ALBERS
        );
        assert_eq!(
            Crs::parse("urn:ogc:def:crs:EPSG::3338").unwrap(),
            Crs::ALASKA_ALBERS
        );
        assert!(Crs::parse("EPSG:abc").is_err());
        assert!(Crs::parse("WGS84").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Crs::ALASKA_ALBERS.to_string(), "EPSG:3338");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Crs::WGS84).unwrap();
        assert_eq!(json, "\"EPSG:4326\"");
        let back: Crs = serde_json::from_str("\"EPSG:3338\"").unwrap();
        assert_eq!(back, Crs::ALASKA_ALBERS);
    }
}
