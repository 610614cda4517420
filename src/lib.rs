//! raster-stac: STAC Items from raster datasets
//!
//! This library reads raster datasets through GDAL and describes them as
//! STAC Items: footprint and bbox in geographic coordinates, projection
//! metadata, per-band statistics and histograms, EO band names, and assets
//! collected from a directory of related files.

pub mod types;
pub mod stac;
pub mod io;
pub mod core;

#[cfg(test)]
mod testing;

// Re-export main types and functions for easier access
pub use crate::types::{Bbox, GeoTransform, Nodata, StacError, StacResult};

pub use crate::stac::{Asset, AssetExt, AssetMap, Geometry, Item, Link, MediaType};

pub use crate::io::{
    build_stac_assets, CollectOptions, GdalRaster, MemoryRaster, RasterHandle, Source,
};

pub use crate::core::{create_stac_asset, create_stac_item, AssetOptions, DatetimeInput, ItemOptions};
