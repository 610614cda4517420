//! Raster access abstraction.
//!
//! Everything downstream reads rasters through [`RasterHandle`], so the
//! pipeline works the same on GDAL datasets, in-memory rasters and the
//! ground-control-point view.

use gdal::spatial_ref::SpatialRef;
use ndarray::Array2;
use std::collections::HashMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::types::{Bbox, GeoTransform, StacResult};

/// Metadata domain holding remote-sensing imagery tags
pub const IMAGERY_DOMAIN: &str = "IMAGERY";

/// Default (unnamed) metadata domain
pub const DEFAULT_DOMAIN: &str = "";

/// Per-band descriptive metadata
#[derive(Debug, Clone, PartialEq)]
pub struct BandInfo {
    /// Lower-case data type name (`uint8`, `int16`, `float32`, ...)
    pub data_type: String,
    pub scale: f64,
    pub offset: f64,
    pub nodata: Option<f64>,
    pub unit: Option<String>,
    pub description: Option<String>,
    /// Lower-case colour interpretation name (`gray`, `red`, `undefined`, ...)
    pub color_interp: Option<String>,
}

impl Default for BandInfo {
    fn default() -> Self {
        Self {
            data_type: "float64".to_string(),
            scale: 1.0,
            offset: 0.0,
            nodata: None,
            unit: None,
            description: None,
            color_interp: None,
        }
    }
}

/// Ground control point tying a pixel/line position to a georeferenced one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundControlPoint {
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Ground control points of a dataset with the CRS of their coordinates
#[derive(Clone)]
pub struct GcpSet {
    pub points: Vec<GroundControlPoint>,
    pub crs: Option<SpatialRef>,
}

/// An open raster dataset
pub trait RasterHandle {
    /// Dataset name, usually the path it was opened from
    fn name(&self) -> String;

    /// GDAL driver short name
    fn driver(&self) -> String;

    fn crs(&self) -> Option<SpatialRef>;

    /// GDAL geotransform, identity when the dataset has none
    fn geo_transform(&self) -> GeoTransform;

    /// `(width, height)` in pixels
    fn size(&self) -> (usize, usize);

    fn band_count(&self) -> usize;

    /// Band metadata, `index` is 1-based
    fn band_info(&self, index: usize) -> StacResult<BandInfo>;

    fn tags(&self, domain: &str) -> HashMap<String, String>;

    fn band_tags(&self, index: usize, domain: &str) -> HashMap<String, String>;

    fn gcps(&self) -> Option<GcpSet> {
        None
    }

    /// Read band `index` resampled (nearest neighbour) to `(height, width)`
    fn read_band(&self, index: usize, shape: (usize, usize)) -> StacResult<Array2<f64>>;

    fn tag(&self, key: &str, domain: &str) -> Option<String> {
        self.tags(domain).remove(key)
    }

    fn width(&self) -> usize {
        self.size().0
    }

    fn height(&self) -> usize {
        self.size().1
    }

    /// Native bounds: extent of the four pixel corners under the geotransform
    fn bounds(&self) -> Bbox {
        let gt = self.geo_transform();
        let (w, h) = self.size();
        let corners = [(0.0, 0.0), (w as f64, 0.0), (w as f64, h as f64), (0.0, h as f64)]
            .map(|(px, py)| apply_geo_transform(&gt, px, py));
        Bbox::from_positions(corners.iter()).unwrap_or(Bbox::new(0.0, 0.0, 0.0, 0.0))
    }
}

/// Pixel/line to georeferenced coordinates
pub fn apply_geo_transform(gt: &GeoTransform, px: f64, py: f64) -> [f64; 2] {
    [
        gt[0] + px * gt[1] + py * gt[2],
        gt[3] + px * gt[4] + py * gt[5],
    ]
}

/// Opens rasters by path
pub trait RasterOpener {
    fn open(&self, path: &Path) -> StacResult<Box<dyn RasterHandle>>;
}

/// A raster given either as a path to open or as a handle the caller owns
pub enum Source<'a> {
    Path(PathBuf),
    Handle(&'a dyn RasterHandle),
}

impl<'a> Source<'a> {
    /// Acquire the raster. Paths are opened and closed when the guard drops,
    /// caller handles are only borrowed.
    pub fn acquire(&self, opener: &dyn RasterOpener) -> StacResult<Acquired<'a>> {
        match self {
            Source::Path(path) => Ok(Acquired::Owned(opener.open(path)?)),
            Source::Handle(handle) => Ok(Acquired::Borrowed(*handle)),
        }
    }
}

impl From<PathBuf> for Source<'_> {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&Path> for Source<'_> {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<&str> for Source<'_> {
    fn from(path: &str) -> Self {
        Source::Path(PathBuf::from(path))
    }
}

impl<'a> From<&'a dyn RasterHandle> for Source<'a> {
    fn from(handle: &'a dyn RasterHandle) -> Self {
        Source::Handle(handle)
    }
}

/// Scoped raster handle produced by [`Source::acquire`]
pub enum Acquired<'a> {
    Owned(Box<dyn RasterHandle>),
    Borrowed(&'a dyn RasterHandle),
}

impl<'a> Deref for Acquired<'a> {
    type Target = dyn RasterHandle + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            Acquired::Owned(handle) => handle.as_ref(),
            Acquired::Borrowed(handle) => *handle,
        }
    }
}
