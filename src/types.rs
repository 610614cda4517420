use serde::{Serialize, Serializer};

/// GDAL-ordered geotransform `[x0, dx, rx, y0, ry, dy]`
pub type GeoTransform = [f64; 6];

/// Identity geotransform used for datasets without georeferencing
pub const IDENTITY_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Axis-aligned bounding box `(xmin, ymin, xmax, ymax)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bbox {
    /// Whole-globe extent used when a dataset carries no CRS
    pub const WORLD: Bbox = Bbox {
        xmin: -180.0,
        ymin: -90.0,
        xmax: 180.0,
        ymax: 90.0,
    };

    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Tight bounds of a set of `[x, y]` positions, `None` when empty
    pub fn from_positions<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f64; 2]>,
    {
        let mut bbox: Option<Bbox> = None;
        for p in positions {
            bbox = Some(match bbox {
                None => Bbox::new(p[0], p[1], p[0], p[1]),
                Some(b) => Bbox::new(
                    b.xmin.min(p[0]),
                    b.ymin.min(p[1]),
                    b.xmax.max(p[0]),
                    b.ymax.max(p[1]),
                ),
            });
        }
        bbox
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

impl From<[f64; 4]> for Bbox {
    fn from(v: [f64; 4]) -> Self {
        Bbox::new(v[0], v[1], v[2], v[3])
    }
}

impl Serialize for Bbox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

/// Band nodata value as written to STAC.
///
/// JSON cannot carry non-finite numbers, so NaN and the infinities are
/// written as the strings `"nan"`, `"inf"` and `"-inf"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nodata {
    Value(f64),
    NaN,
    Inf,
    NegInf,
}

impl Nodata {
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Nodata::NaN
        } else if value == f64::INFINITY {
            Nodata::Inf
        } else if value == f64::NEG_INFINITY {
            Nodata::NegInf
        } else {
            Nodata::Value(value)
        }
    }

    /// Whether a pixel value is the nodata value
    pub fn matches(&self, pixel: f64) -> bool {
        match self {
            Nodata::Value(v) => pixel == *v,
            Nodata::NaN => pixel.is_nan(),
            Nodata::Inf => pixel == f64::INFINITY,
            Nodata::NegInf => pixel == f64::NEG_INFINITY,
        }
    }
}

impl Serialize for Nodata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nodata::Value(v) => serializer.serialize_f64(*v),
            Nodata::NaN => serializer.serialize_str("nan"),
            Nodata::Inf => serializer.serialize_str("inf"),
            Nodata::NegInf => serializer.serialize_str("-inf"),
        }
    }
}

/// Error types for STAC generation
#[derive(Debug, thiserror::Error)]
pub enum StacError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot read source: {0}")]
    SourceUnreadable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for STAC operations
pub type StacResult<T> = Result<T, StacError>;
