use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Legacy (GeoJSON 2008) named CRS member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    #[serde(rename = "type", default = "default_crs_type")]
    pub kind: String,
    pub properties: CrsProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsProperties {
    pub name: String,
}

fn default_crs_type() -> String {
    "name".to_string()
}

/// Reference system declared by the source.
///
/// Geographic and Web Mercator input are handled natively; any other EPSG
/// code is looked up in the bundled projection definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCrs {
    Wgs84,
    WebMercator,
    Epsg(u16),
}

impl SourceCrs {
    /// Resolve an optional CRS member. A missing member means EPSG:4326.
    pub fn resolve(crs: Option<&Crs>) -> Result<Self> {
        match crs {
            None => Ok(SourceCrs::Wgs84),
            Some(crs) => Self::from_name(&crs.properties.name),
        }
    }

    /// Recognise `EPSG:4326`, `urn:ogc:def:crs:EPSG::3857`, `CRS84` and friends.
    pub fn from_name(name: &str) -> Result<Self> {
        let upper = name.trim().to_ascii_uppercase();

        if upper.ends_with("CRS84") || upper.ends_with("CRS:84") {
            return Ok(SourceCrs::Wgs84);
        }

        let code = upper
            .rsplit(':')
            .next()
            .filter(|c| !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit()));

        match (upper.contains("EPSG"), code) {
            (true, Some("4326")) => Ok(SourceCrs::Wgs84),
            (true, Some("3857" | "900913" | "3785" | "102100")) => Ok(SourceCrs::WebMercator),
            (true, Some(code)) => code
                .parse()
                .map(SourceCrs::Epsg)
                .map_err(|_| Error::UnsupportedCrs(name.to_string())),
            _ => Err(Error::UnsupportedCrs(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_crs_is_wgs84() {
        assert_eq!(SourceCrs::resolve(None).unwrap(), SourceCrs::Wgs84);
    }

    #[test]
    fn test_crs_names() {
        assert_eq!(SourceCrs::from_name("EPSG:4326").unwrap(), SourceCrs::Wgs84);
        assert_eq!(
            SourceCrs::from_name("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(),
            SourceCrs::Wgs84
        );
        assert_eq!(
            SourceCrs::from_name("urn:ogc:def:crs:EPSG::3857").unwrap(),
            SourceCrs::WebMercator
        );
        assert_eq!(
            SourceCrs::from_name("epsg:900913").unwrap(),
            SourceCrs::WebMercator
        );
    }

    #[test]
    fn test_other_epsg_codes() {
        assert_eq!(SourceCrs::from_name("EPSG:3776").unwrap(), SourceCrs::Epsg(3776));
        assert_eq!(
            SourceCrs::from_name("urn:ogc:def:crs:EPSG::32611").unwrap(),
            SourceCrs::Epsg(32611)
        );
    }

    #[test]
    fn test_unsupported_crs() {
        let err = SourceCrs::from_name("urn:ogc:def:crs:ESRI::54009").unwrap_err();
        assert!(matches!(err, Error::UnsupportedCrs(name) if name == "urn:ogc:def:crs:ESRI::54009"));

        assert!(SourceCrs::from_name("EPSG:999999").is_err());
    }

    #[test]
    fn test_parse_crs_member() {
        let json = r#"{"type": "name", "properties": {"name": "EPSG:3857"}}"#;
        let crs: Crs = serde_json::from_str(json).unwrap();
        assert_eq!(SourceCrs::resolve(Some(&crs)).unwrap(), SourceCrs::WebMercator);
    }
}
