//! In-memory rasters.
//!
//! Useful for callers that already hold pixel arrays, and for exercising the
//! pipeline without touching the filesystem.

use crate::io::raster::{BandInfo, GcpSet, RasterHandle, RasterOpener};
use crate::types::{GeoTransform, StacError, StacResult, IDENTITY_TRANSFORM};
use gdal::spatial_ref::SpatialRef;
use ndarray::Array2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

type TagDomains = HashMap<String, HashMap<String, String>>;

/// A single in-memory band
#[derive(Debug, Clone)]
pub struct MemoryBand {
    pub data: Array2<f64>,
    pub info: BandInfo,
    pub tags: TagDomains,
}

impl MemoryBand {
    pub fn new(data: Array2<f64>) -> Self {
        Self {
            data,
            info: BandInfo::default(),
            tags: HashMap::new(),
        }
    }

    pub fn with_data_type(mut self, data_type: &str) -> Self {
        self.info.data_type = data_type.to_string();
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.info.nodata = Some(nodata);
        self
    }

    pub fn with_scale_offset(mut self, scale: f64, offset: f64) -> Self {
        self.info.scale = scale;
        self.info.offset = offset;
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.info.unit = Some(unit.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.info.description = Some(description.to_string());
        self
    }

    pub fn with_color_interp(mut self, color: &str) -> Self {
        self.info.color_interp = Some(color.to_lowercase());
        self
    }

    pub fn with_tag(mut self, domain: &str, key: &str, value: &str) -> Self {
        self.tags
            .entry(domain.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }
}

/// An in-memory raster dataset
#[derive(Clone)]
pub struct MemoryRaster {
    pub name: String,
    pub driver: String,
    pub width: usize,
    pub height: usize,
    pub crs: Option<SpatialRef>,
    pub geo_transform: GeoTransform,
    pub bands: Vec<MemoryBand>,
    pub tags: TagDomains,
    pub gcps: Option<GcpSet>,
}

impl MemoryRaster {
    pub fn new(name: &str, width: usize, height: usize) -> Self {
        Self {
            name: name.to_string(),
            driver: "MEM".to_string(),
            width,
            height,
            crs: None,
            geo_transform: IDENTITY_TRANSFORM,
            bands: Vec::new(),
            tags: HashMap::new(),
            gcps: None,
        }
    }

    pub fn with_driver(mut self, driver: &str) -> Self {
        self.driver = driver.to_string();
        self
    }

    pub fn with_crs(mut self, crs: SpatialRef) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_geo_transform(mut self, geo_transform: GeoTransform) -> Self {
        self.geo_transform = geo_transform;
        self
    }

    /// Add a band; its array must match the raster size
    pub fn with_band(mut self, band: MemoryBand) -> StacResult<Self> {
        let (rows, cols) = band.data.dim();
        if rows != self.height || cols != self.width {
            return Err(StacError::InvalidArgument(format!(
                "Band shape {}x{} does not match raster size {}x{}",
                cols, rows, self.width, self.height
            )));
        }
        self.bands.push(band);
        Ok(self)
    }

    pub fn with_tag(mut self, domain: &str, key: &str, value: &str) -> Self {
        self.tags
            .entry(domain.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_gcps(mut self, gcps: GcpSet) -> Self {
        self.gcps = Some(gcps);
        self
    }

    fn band(&self, index: usize) -> StacResult<&MemoryBand> {
        index
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or_else(|| {
                StacError::InvalidArgument(format!(
                    "Band index {} out of range (1..={})",
                    index,
                    self.bands.len()
                ))
            })
    }
}

impl RasterHandle for MemoryRaster {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn driver(&self) -> String {
        self.driver.clone()
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
        self.bands.len()
    }

    fn band_info(&self, index: usize) -> StacResult<BandInfo> {
        Ok(self.band(index)?.info.clone())
    }

    fn tags(&self, domain: &str) -> HashMap<String, String> {
        self.tags.get(domain).cloned().unwrap_or_default()
    }

    fn band_tags(&self, index: usize, domain: &str) -> HashMap<String, String> {
        self.band(index)
            .ok()
            .and_then(|band| band.tags.get(domain).cloned())
            .unwrap_or_default()
    }

    fn gcps(&self) -> Option<GcpSet> {
        self.gcps.clone()
    }

    fn read_band(&self, index: usize, shape: (usize, usize)) -> StacResult<Array2<f64>> {
        let band = self.band(index)?;
        let (out_rows, out_cols) = shape;
        if out_rows == self.height && out_cols == self.width {
            return Ok(band.data.clone());
        }
        Ok(resample_nearest(&band.data, shape))
    }
}

/// Nearest-neighbour resampling sampling each output pixel at its centre
pub fn resample_nearest(data: &Array2<f64>, shape: (usize, usize)) -> Array2<f64> {
    let (rows, cols) = data.dim();
    let (out_rows, out_cols) = shape;
    if rows == 0 || cols == 0 {
        return Array2::zeros(shape);
    }

    let source_index = |i: usize, src: usize, out: usize| -> usize {
        let idx = ((i as f64 + 0.5) * src as f64 / out as f64).floor() as usize;
        idx.min(src - 1)
    };

    Array2::from_shape_fn(shape, |(i, j)| {
        data[[
            source_index(i, rows, out_rows),
            source_index(j, cols, out_cols),
        ]]
    })
}

/// Serves registered in-memory rasters by path
#[derive(Clone, Default)]
pub struct MemoryOpener {
    rasters: HashMap<PathBuf, MemoryRaster>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: AsRef<Path>>(&mut self, path: P, raster: MemoryRaster) {
        self.rasters.insert(path.as_ref().to_path_buf(), raster);
    }
}

impl RasterOpener for MemoryOpener {
    fn open(&self, path: &Path) -> StacResult<Box<dyn RasterHandle>> {
        match self.rasters.get(path) {
            Some(raster) => Ok(Box::new(raster.clone())),
            None => Err(StacError::SourceUnreadable(format!(
                "{}: not a registered raster",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_shape_checked() {
        let raster = MemoryRaster::new("test", 4, 3);
        let result = raster.with_band(MemoryBand::new(Array2::zeros((4, 3))));
        assert!(result.is_err());
    }

    #[test]
    fn test_band_index_is_one_based() {
        let raster = MemoryRaster::new("test", 2, 2)
            .with_band(MemoryBand::new(Array2::zeros((2, 2))).with_nodata(0.0))
            .unwrap();

        assert!(raster.band_info(0).is_err());
        assert_eq!(raster.band_info(1).unwrap().nodata, Some(0.0));
        assert!(raster.band_info(2).is_err());
    }

    #[test]
    fn test_resample_nearest_decimation() {
        let data = Array2::from_shape_fn((4, 4), |(i, j)| (i * 4 + j) as f64);
        let out = resample_nearest(&data, (2, 2));

        // centres of the 2x2 output fall on source pixels (1,1), (1,3), (3,1), (3,3)
        assert_eq!(out[[0, 0]], 5.0);
        assert_eq!(out[[0, 1]], 7.0);
        assert_eq!(out[[1, 0]], 13.0);
        assert_eq!(out[[1, 1]], 15.0);
    }

    #[test]
    fn test_read_band_full_resolution() {
        let data = Array2::from_shape_fn((3, 5), |(i, j)| (i + j) as f64);
        let raster = MemoryRaster::new("test", 5, 3)
            .with_band(MemoryBand::new(data.clone()))
            .unwrap();

        let read = raster.read_band(1, (3, 5)).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn test_opener_serves_registered_rasters() {
        let mut opener = MemoryOpener::new();
        opener.register("/data/a.tif", MemoryRaster::new("/data/a.tif", 1, 1));

        let handle = opener.open(Path::new("/data/a.tif")).unwrap();
        assert_eq!(handle.name(), "/data/a.tif");
        assert!(matches!(
            opener.open(Path::new("/data/b.tif")),
            Err(StacError::SourceUnreadable(_))
        ));
    }

    #[test]
    fn test_tags_by_domain() {
        let raster = MemoryRaster::new("test", 1, 1)
            .with_tag("IMAGERY", "CLOUDCOVER", "12")
            .with_tag("", "AREA_OR_POINT", "Point");

        assert_eq!(raster.tag("CLOUDCOVER", "IMAGERY").as_deref(), Some("12"));
        assert_eq!(raster.tag("AREA_OR_POINT", "").as_deref(), Some("Point"));
        assert!(raster.tag("CLOUDCOVER", "").is_none());
    }
}
