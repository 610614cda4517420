use crate::core::eo::{get_eobands_info, EoBand};
use crate::core::media_type::get_media_type;
use crate::core::projection::get_projection_info;
use crate::core::statistics::{get_raster_info, RasterBand, DEFAULT_HISTOGRAM_BINS, DEFAULT_MAX_SIZE};
use crate::io::gdal_raster::GdalOpener;
use crate::io::raster::{RasterHandle, RasterOpener, Source};
use crate::stac::{Asset, AssetExt, MediaType};
use crate::types::{StacError, StacResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;

/// A merged band object (EO fields overlaid with raster fields)
pub type Band = Map<String, Value>;

/// How the media type of a generated asset is chosen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediaTypeOption {
    /// Sniffed from the GDAL driver
    #[default]
    Auto,
    Explicit(String),
    Unset,
}

impl From<MediaType> for MediaTypeOption {
    fn from(media_type: MediaType) -> Self {
        MediaTypeOption::Explicit(media_type.as_str().to_string())
    }
}

impl FromStr for MediaTypeOption {
    type Err = StacError;

    /// `auto`, or a media type name / string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(MediaTypeOption::Auto);
        }
        Ok(s.parse::<MediaType>()?.into())
    }
}

/// Options for building an asset from a raster
#[derive(Debug, Clone, PartialEq)]
pub struct AssetOptions {
    pub roles: Vec<String>,
    pub media_type: MediaTypeOption,
    /// Defaults to the dataset name
    pub href: Option<String>,
    pub with_proj: bool,
    pub with_raster: bool,
    pub with_eo: bool,
    pub raster_max_size: usize,
    pub histogram_bins: usize,
    pub histogram_range: Option<(f64, f64)>,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            roles: Vec::new(),
            media_type: MediaTypeOption::Auto,
            href: None,
            with_proj: false,
            with_raster: false,
            with_eo: false,
            raster_max_size: DEFAULT_MAX_SIZE,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            histogram_range: None,
        }
    }
}

fn overlay<T: Serialize>(band: &mut Band, fields: &T) -> StacResult<()> {
    if let Value::Object(fields) = serde_json::to_value(fields)? {
        for (key, value) in fields {
            band.insert(key, value);
        }
    }
    Ok(())
}

/// Merge the raster and EO band tracks by position. Raster fields win on
/// key collisions; a missing name becomes `b<index>`.
pub fn merge_bands(raster: &[RasterBand], eo: &[EoBand]) -> StacResult<Vec<Band>> {
    let count = raster.len().max(eo.len());
    let mut bands = Vec::with_capacity(count);

    for idx in 0..count {
        let mut band = Band::new();
        if let Some(eo_band) = eo.get(idx) {
            overlay(&mut band, eo_band)?;
        }
        if let Some(raster_band) = raster.get(idx) {
            overlay(&mut band, raster_band)?;
        }
        band.entry("name")
            .or_insert_with(|| Value::String(format!("b{}", idx + 1)));
        bands.push(band);
    }

    Ok(bands)
}

/// Build an asset from an open raster
pub fn build_asset(
    handle: &dyn RasterHandle,
    options: &AssetOptions,
) -> StacResult<(Asset, Vec<Band>)> {
    let media_type = match &options.media_type {
        MediaTypeOption::Auto => get_media_type(handle).map(|m| m.as_str().to_string()),
        MediaTypeOption::Explicit(media_type) => Some(media_type.clone()),
        MediaTypeOption::Unset => None,
    };

    let mut asset = Asset::new(options.href.clone().unwrap_or_else(|| handle.name()))
        .with_media_type(media_type)
        .with_roles(options.roles.iter().cloned());

    if options.with_proj {
        asset.additional_fields.extend(get_projection_info(handle).to_fields());
    }

    let raster_bands = if options.with_raster {
        get_raster_info(
            handle,
            options.raster_max_size,
            options.histogram_bins,
            options.histogram_range,
        )?
    } else {
        Vec::new()
    };

    let eo_bands = if options.with_eo {
        get_eobands_info(handle)?
    } else {
        Vec::new()
    };

    let bands = merge_bands(&raster_bands, &eo_bands)?;
    if !bands.is_empty() {
        asset.additional_fields.insert(
            "bands".to_string(),
            Value::Array(bands.iter().cloned().map(Value::Object).collect()),
        );
    }

    Ok((asset, bands))
}

/// Build an asset from a path or an open raster, opening paths with GDAL
pub fn create_stac_asset(
    source: Source<'_>,
    options: &AssetOptions,
) -> StacResult<(Asset, Vec<Band>)> {
    create_stac_asset_with(source, options, &GdalOpener)
}

/// [`create_stac_asset`] with a custom opener
pub fn create_stac_asset_with(
    source: Source<'_>,
    options: &AssetOptions,
    opener: &dyn RasterOpener,
) -> StacResult<(Asset, Vec<Band>)> {
    let handle = source.acquire(opener)?;
    build_asset(&*handle, options)
}
