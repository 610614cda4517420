use crate::io::raster::{BandInfo, GcpSet, GroundControlPoint, RasterHandle, RasterOpener};
use crate::types::{GeoTransform, StacError, StacResult, IDENTITY_TRANSFORM};
use gdal::raster::RasterBand;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DatasetOptions, GdalOpenFlags, Metadata};
use ndarray::Array2;
use std::collections::HashMap;
use std::ffi::CStr;
use std::path::Path;

/// Raster dataset read through GDAL
pub struct GdalRaster {
    dataset: Dataset,
    name: String,
}

impl GdalRaster {
    /// Open a raster file (or any GDAL connection string) with the raster drivers
    pub fn open<P: AsRef<Path>>(path: P) -> StacResult<Self> {
        let path = path.as_ref();
        log::debug!("Opening raster: {}", path.display());

        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_READONLY
                | GdalOpenFlags::GDAL_OF_RASTER
                | GdalOpenFlags::GDAL_OF_VERBOSE_ERROR,
            allowed_drivers: None,
            open_options: None,
            sibling_files: None,
        };
        let dataset = Dataset::open_ex(path, options).map_err(|e| {
            StacError::SourceUnreadable(format!("{}: {}", path.display(), e))
        })?;

        let (width, height) = dataset.raster_size();
        log::debug!(
            "Raster size: {}x{}, {} band(s), driver {}",
            width,
            height,
            dataset.raster_count(),
            dataset.driver().short_name()
        );

        Ok(Self {
            dataset,
            name: path.to_string_lossy().into_owned(),
        })
    }

    /// Wrap an already opened dataset
    pub fn from_dataset(dataset: Dataset) -> Self {
        let name = dataset.description().unwrap_or_default();
        Self { dataset, name }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn band(&self, index: usize) -> StacResult<RasterBand<'_>> {
        if index == 0 || index > self.band_count() {
            return Err(StacError::InvalidArgument(format!(
                "Band index {} out of range (1..={})",
                index,
                self.band_count()
            )));
        }
        Ok(self.dataset.rasterband(index as isize)?)
    }
}

/// `KEY=VALUE` metadata entries to a map
fn parse_metadata_entries(entries: Option<Vec<String>>) -> HashMap<String, String> {
    entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| {
            entry
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

impl RasterHandle for GdalRaster {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn driver(&self) -> String {
        self.dataset.driver().short_name()
    }

    fn crs(&self) -> Option<SpatialRef> {
        if self.dataset.projection().trim().is_empty() {
            return None;
        }
        self.dataset.spatial_ref().ok()
    }

    fn geo_transform(&self) -> GeoTransform {
        self.dataset.geo_transform().unwrap_or(IDENTITY_TRANSFORM)
    }

    fn size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    fn band_count(&self) -> usize {
        self.dataset.raster_count().max(0) as usize
    }

    fn band_info(&self, index: usize) -> StacResult<BandInfo> {
        let band = self.band(index)?;

        let unit = band.unit();
        let description = band.description().ok().filter(|d| !d.is_empty());

        Ok(BandInfo {
            data_type: format!("{:?}", band.band_type()).to_lowercase(),
            scale: band.scale().unwrap_or(1.0),
            offset: band.offset().unwrap_or(0.0),
            nodata: band.no_data_value(),
            unit: if unit.is_empty() { None } else { Some(unit) },
            description,
            color_interp: Some(band.color_interpretation().name().to_lowercase()),
        })
    }

    fn tags(&self, domain: &str) -> HashMap<String, String> {
        parse_metadata_entries(self.dataset.metadata_domain(domain))
    }

    fn band_tags(&self, index: usize, domain: &str) -> HashMap<String, String> {
        match self.band(index) {
            Ok(band) => parse_metadata_entries(band.metadata_domain(domain)),
            Err(_) => HashMap::new(),
        }
    }

    fn gcps(&self) -> Option<GcpSet> {
        let c_dataset = unsafe { self.dataset.c_dataset() };

        let count = unsafe { gdal_sys::GDALGetGCPCount(c_dataset) };
        if count <= 0 {
            return None;
        }

        let points = unsafe {
            let gcps = gdal_sys::GDALGetGCPs(c_dataset);
            if gcps.is_null() {
                return None;
            }
            std::slice::from_raw_parts(gcps, count as usize)
                .iter()
                .map(|gcp| GroundControlPoint {
                    pixel: gcp.dfGCPPixel,
                    line: gcp.dfGCPLine,
                    x: gcp.dfGCPX,
                    y: gcp.dfGCPY,
                    z: gcp.dfGCPZ,
                })
                .collect::<Vec<_>>()
        };

        let wkt = unsafe {
            let projection = gdal_sys::GDALGetGCPProjection(c_dataset);
            if projection.is_null() {
                None
            } else {
                CStr::from_ptr(projection).to_str().ok().map(str::to_owned)
            }
        };
        let crs = wkt
            .filter(|w| !w.trim().is_empty())
            .and_then(|w| SpatialRef::from_wkt(&w).ok());

        log::debug!("Dataset carries {} ground control points", points.len());
        Some(GcpSet { points, crs })
    }

    fn read_band(&self, index: usize, shape: (usize, usize)) -> StacResult<Array2<f64>> {
        let band = self.band(index)?;
        let (width, height) = self.size();
        let (out_height, out_width) = shape;

        let buffer = band.read_as::<f64>((0, 0), (width, height), (out_width, out_height), None)?;

        Array2::from_shape_vec((out_height, out_width), buffer.data)
            .map_err(|e| StacError::Processing(format!("Failed to reshape band {}: {}", index, e)))
    }
}

/// Opens rasters with GDAL
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalOpener;

impl RasterOpener for GdalOpener {
    fn open(&self, path: &Path) -> StacResult<Box<dyn RasterHandle>> {
        Ok(Box::new(GdalRaster::open(path)?))
    }
}
