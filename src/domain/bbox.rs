use serde::Deserialize;

use crate::error::{Error, Result};

/// Geographic bounding box in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl Default for BoundingBox {
    /// Roughly three blocks of downtown Calgary
    fn default() -> Self {
        Self {
            north: 51.0465,
            south: 51.0440,
            west: -114.0685,
            east: -114.0635,
        }
    }
}

impl BoundingBox {
    pub fn validate(&self) -> Result<()> {
        let all = [self.north, self.south, self.west, self.east];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidBoundingBox("coordinates must be finite".into()));
        }
        if !(-90.0..=90.0).contains(&self.north) || !(-90.0..=90.0).contains(&self.south) {
            return Err(Error::InvalidBoundingBox(format!(
                "latitudes out of range: north={}, south={}",
                self.north, self.south
            )));
        }
        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err(Error::InvalidBoundingBox(format!(
                "longitudes out of range: west={}, east={}",
                self.west, self.east
            )));
        }
        if self.north <= self.south {
            return Err(Error::InvalidBoundingBox(format!(
                "north ({}) must be greater than south ({})",
                self.north, self.south
            )));
        }
        if self.east <= self.west {
            return Err(Error::InvalidBoundingBox(format!(
                "east ({}) must be greater than west ({})",
                self.east, self.west
            )));
        }
        Ok(())
    }

    /// SoQL spatial predicate selecting rows whose `column` lies in this box.
    ///
    /// `within_box` takes the north-west corner first, then the south-east one.
    pub fn within_box_clause(&self, column: &str) -> String {
        format!(
            "within_box({}, {}, {}, {}, {})",
            column, self.north, self.west, self.south, self.east
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_box_clause() {
        let clause = BoundingBox::default().within_box_clause("polygon");
        assert_eq!(
            clause,
            "within_box(polygon, 51.0465, -114.0685, 51.044, -114.0635)"
        );
    }

    #[test]
    fn test_default_is_valid() {
        assert!(BoundingBox::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_box_rejected() {
        let bbox = BoundingBox {
            north: 51.0,
            south: 51.1,
            ..BoundingBox::default()
        };
        assert!(matches!(bbox.validate(), Err(Error::InvalidBoundingBox(_))));

        let bbox = BoundingBox {
            west: -114.0,
            east: -114.1,
            ..BoundingBox::default()
        };
        assert!(matches!(bbox.validate(), Err(Error::InvalidBoundingBox(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let bbox = BoundingBox {
            north: 91.0,
            ..BoundingBox::default()
        };
        assert!(bbox.validate().is_err());

        let bbox = BoundingBox {
            east: f64::NAN,
            ..BoundingBox::default()
        };
        assert!(bbox.validate().is_err());
    }
}
