use crate::io::raster::{RasterHandle, IMAGERY_DOMAIN};
use crate::types::StacResult;
use serde::Serialize;

/// Band common names of the EO extension
pub const EO_COMMON_NAMES: [&str; 20] = [
    "pan",
    "coastal",
    "blue",
    "green",
    "green05",
    "yellow",
    "red",
    "rededge",
    "rededge071",
    "rededge075",
    "rededge078",
    "nir",
    "nir08",
    "nir09",
    "cirrus",
    "swir16",
    "swir22",
    "lwir",
    "lwir11",
    "lwir12",
];

/// EO extension band object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EoBand {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "eo:common_name", skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(rename = "eo:center_wavelength", skip_serializing_if = "Option::is_none")]
    pub center_wavelength: Option<f64>,
    #[serde(rename = "eo:full_width_half_max", skip_serializing_if = "Option::is_none")]
    pub full_width_half_max: Option<f64>,
}

/// Common name matching a band description or colour name, if any.
///
/// Matching ignores case and spaces; `gray`/`grey` map to `pan`.
pub fn common_name(candidate: &str) -> Option<&'static str> {
    let normalized: String = candidate
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    let normalized = match normalized.as_str() {
        "gray" | "grey" => "pan",
        other => other,
    };
    EO_COMMON_NAMES.iter().copied().find(|n| *n == normalized)
}

/// EO extension metadata for every band of a dataset
pub fn get_eobands_info(handle: &dyn RasterHandle) -> StacResult<Vec<EoBand>> {
    let dataset_imagery = handle.tags(IMAGERY_DOMAIN);

    let mut bands = Vec::with_capacity(handle.band_count());
    for index in 1..=handle.band_count() {
        let info = handle.band_info(index)?;
        let descr = info.description.filter(|d| !d.is_empty());
        let color = info.color_interp.filter(|c| !c.is_empty());

        let band_imagery = handle.band_tags(index, IMAGERY_DOMAIN);
        let imagery = if band_imagery.is_empty() {
            &dataset_imagery
        } else {
            &band_imagery
        };
        let parse = |key: &str| imagery.get(key).and_then(|v| v.trim().parse::<f64>().ok());

        let common = [descr.as_deref(), color.as_deref()]
            .into_iter()
            .flatten()
            .find_map(common_name);

        bands.push(EoBand {
            name: format!("b{}", index),
            description: descr.or(color),
            common_name: common.map(str::to_string),
            center_wavelength: parse("CENTRAL_WAVELENGTH_UM"),
            full_width_half_max: parse("FWHM_UM"),
        });
    }

    Ok(bands)
}
