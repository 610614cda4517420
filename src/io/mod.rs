//! Raster access: dataset handles, openers and directory collection

pub mod collector;
pub mod gcp;
pub mod gdal_raster;
pub mod memory;
pub mod raster;

// Re-export main types
pub use collector::{build_stac_assets, build_stac_assets_with, CollectOptions};
pub use gcp::GcpView;
pub use gdal_raster::{GdalOpener, GdalRaster};
pub use memory::{MemoryBand, MemoryOpener, MemoryRaster};
pub use raster::{BandInfo, GcpSet, GroundControlPoint, RasterHandle, RasterOpener, Source};
