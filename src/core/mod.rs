//! Core STAC metadata modules

pub mod antimeridian;
pub mod asset;
pub mod eo;
pub mod geometry;
pub mod item;
pub mod media_type;
pub mod projection;
pub mod statistics;

// Re-export main types
pub use asset::{create_stac_asset, create_stac_asset_with, AssetOptions, Band, MediaTypeOption};
pub use eo::{get_eobands_info, EoBand};
pub use geometry::{bbox_to_geom, get_dataset_geom, DatasetGeometry};
pub use item::{create_stac_item, create_stac_item_with, DatetimeInput, ItemOptions};
pub use media_type::get_media_type;
pub use projection::{get_projection_info, ProjectionInfo};
pub use statistics::{get_raster_info, BandStatistics, Histogram, RasterBand};
