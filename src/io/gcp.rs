//! Georeferencing view for datasets located by ground control points.
//!
//! The GCPs are fitted with a first-order polynomial (affine) transform and
//! the image corners are mapped through it. The view then exposes a north-up
//! grid over their extent, at a resolution that preserves the number of
//! pixels along the diagonal. Pixel reads and tags pass through to
//! the underlying dataset unchanged.

use crate::io::raster::{apply_geo_transform, BandInfo, GcpSet, GroundControlPoint, RasterHandle};
use crate::types::{Bbox, GeoTransform, StacError, StacResult};
use gdal::spatial_ref::SpatialRef;
use ndarray::Array2;
use std::collections::HashMap;

/// A GCP-georeferenced dataset seen as a regular north-up grid
pub struct GcpView<'a> {
    inner: &'a dyn RasterHandle,
    crs: Option<SpatialRef>,
    geo_transform: GeoTransform,
    width: usize,
    height: usize,
}

impl<'a> GcpView<'a> {
    pub fn new(inner: &'a dyn RasterHandle, gcps: &GcpSet) -> StacResult<Self> {
        let fitted = fit_affine(&gcps.points)?;
        let (width, height) = inner.size();

        let corners = [
            (0.0, 0.0),
            (width as f64, 0.0),
            (width as f64, height as f64),
            (0.0, height as f64),
        ]
        .map(|(px, py)| apply_geo_transform(&fitted, px, py));
        let bounds = Bbox::from_positions(corners.iter())
            .ok_or_else(|| StacError::Processing("Empty GCP footprint".to_string()))?;

        let extent_x = bounds.xmax - bounds.xmin;
        let extent_y = bounds.ymax - bounds.ymin;
        let pixel_diagonal = (width as f64).hypot(height as f64);
        let resolution = extent_x.hypot(extent_y) / pixel_diagonal;
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(StacError::Processing(format!(
                "Degenerate GCP georeferencing (resolution {})",
                resolution
            )));
        }

        let out_width = ((extent_x / resolution).round() as usize).max(1);
        let out_height = ((extent_y / resolution).round() as usize).max(1);

        log::debug!(
            "GCP view: {} points, {}x{} grid at resolution {}",
            gcps.points.len(),
            out_width,
            out_height,
            resolution
        );

        Ok(Self {
            inner,
            crs: gcps.crs.clone(),
            geo_transform: [bounds.xmin, resolution, 0.0, bounds.ymax, 0.0, -resolution],
            width: out_width,
            height: out_height,
        })
    }
}

/// Least-squares affine transform mapping (pixel, line) to (x, y)
pub fn fit_affine(points: &[GroundControlPoint]) -> StacResult<GeoTransform> {
    if points.len() < 3 {
        return Err(StacError::Processing(format!(
            "At least 3 ground control points are required, got {}",
            points.len()
        )));
    }

    // Normal equations A^T A c = A^T b with rows [1, pixel, line]
    let mut ata = [[0.0f64; 3]; 3];
    let mut atx = [0.0f64; 3];
    let mut aty = [0.0f64; 3];
    for gcp in points {
        let row = [1.0, gcp.pixel, gcp.line];
        for i in 0..3 {
            for j in 0..3 {
                ata[i][j] += row[i] * row[j];
            }
            atx[i] += row[i] * gcp.x;
            aty[i] += row[i] * gcp.y;
        }
    }

    let cx = solve3(&ata, &atx)?;
    let cy = solve3(&ata, &aty)?;
    Ok([cx[0], cx[1], cx[2], cy[0], cy[1], cy[2]])
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Cramer's rule
fn solve3(m: &[[f64; 3]; 3], b: &[f64; 3]) -> StacResult<[f64; 3]> {
    let det = det3(m);
    if det.abs() < 1e-12 {
        return Err(StacError::Processing(
            "Ground control points are collinear".to_string(),
        ));
    }

    let mut solution = [0.0; 3];
    for (col, value) in solution.iter_mut().enumerate() {
        let mut replaced = *m;
        for row in 0..3 {
            replaced[row][col] = b[row];
        }
        *value = det3(&replaced) / det;
    }
    Ok(solution)
}

impl RasterHandle for GcpView<'_> {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn driver(&self) -> String {
        self.inner.driver()
    }

    fn crs(&self) -> Option<SpatialRef> {
        self.crs.clone()
    }

    fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn band_count(&self) -> usize {
        self.inner.band_count()
    }

    fn band_info(&self, index: usize) -> StacResult<BandInfo> {
        self.inner.band_info(index)
    }

    fn tags(&self, domain: &str) -> HashMap<String, String> {
        self.inner.tags(domain)
    }

    fn band_tags(&self, index: usize, domain: &str) -> HashMap<String, String> {
        self.inner.band_tags(index, domain)
    }

    fn read_band(&self, index: usize, shape: (usize, usize)) -> StacResult<Array2<f64>> {
        self.inner.read_band(index, shape)
    }
}
