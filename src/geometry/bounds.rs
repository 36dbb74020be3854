use geo::{BoundingRect, MultiPolygon};

/// Lon/lat extent of a feature set
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Extent covering every geometry, or `None` when there is nothing to cover
    pub fn from_geometries<'a>(geometries: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Option<Self> {
        let mut bounds: Option<Self> = None;

        for rect in geometries.into_iter().filter_map(|g| g.bounding_rect()) {
            let (min, max) = (rect.min(), rect.max());
            match bounds.as_mut() {
                Some(b) => {
                    b.min_x = b.min_x.min(min.x);
                    b.min_y = b.min_y.min(min.y);
                    b.max_x = b.max_x.max(max.x);
                    b.max_y = b.max_y.max(max.y);
                }
                None => {
                    bounds = Some(Self {
                        min_x: min.x,
                        min_y: min.y,
                        max_x: max.x,
                        max_y: max.y,
                    })
                }
            }
        }

        bounds
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}, {:.6}, {:.6}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
