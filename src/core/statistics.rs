use crate::io::raster::{RasterHandle, DEFAULT_DOMAIN};
use crate::types::{Nodata, StacError, StacResult};
use ndarray::Array2;
use serde::Serialize;

/// Default number of histogram bins
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Default longest side, in pixels, bands are read at for statistics
pub const DEFAULT_MAX_SIZE: usize = 1024;

/// Summary statistics of the valid pixels of a band.
///
/// The moments are `None` when the band has no valid pixel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
    pub valid_percent: f64,
}

/// Equal-width histogram; `count` is the number of bin edges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub buckets: Vec<u64>,
}

/// Raster extension band object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterBand {
    pub name: String,
    pub data_type: String,
    #[serde(rename = "raster:scale")]
    pub scale: f64,
    #[serde(rename = "raster:offset")]
    pub offset: f64,
    #[serde(rename = "raster:sampling", skip_serializing_if = "Option::is_none")]
    pub sampling: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodata: Option<Nodata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub statistics: BandStatistics,
    #[serde(rename = "raster:histogram")]
    pub histogram: Histogram,
}

/// Shape `(height, width)` a band is read at so that its longest side does
/// not exceed `max_size`. `max_size == 0` keeps the full resolution.
pub fn read_shape(width: usize, height: usize, max_size: usize) -> (usize, usize) {
    if max_size == 0 || width.max(height) <= max_size || width == 0 {
        return (height, width);
    }

    let ratio = height as f64 / width as f64;
    if ratio > 1.0 {
        let out_height = max_size;
        let out_width = (out_height as f64 / ratio).ceil() as usize;
        (out_height, out_width)
    } else {
        let out_width = max_size;
        let out_height = (out_width as f64 * ratio).ceil() as usize;
        (out_height, out_width)
    }
}

/// Pixels that are neither nodata nor non-finite
pub fn valid_values(data: &Array2<f64>, nodata: Option<Nodata>) -> Vec<f64> {
    data.iter()
        .copied()
        .filter(|v| v.is_finite() && !nodata.map_or(false, |nd| nd.matches(*v)))
        .collect()
}

/// Mean, extremes, population standard deviation and valid percentage
pub fn compute_statistics(values: &[f64], total_pixels: usize) -> BandStatistics {
    let valid_percent = if total_pixels == 0 {
        0.0
    } else {
        values.len() as f64 / total_pixels as f64 * 100.0
    };

    if values.is_empty() {
        return BandStatistics {
            mean: None,
            minimum: None,
            maximum: None,
            stddev: None,
            valid_percent,
        };
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let minimum = values.iter().copied().fold(f64::INFINITY, f64::min);
    let maximum = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    BandStatistics {
        mean: Some(mean),
        minimum: Some(minimum),
        maximum: Some(maximum),
        stddev: Some(variance.sqrt()),
        valid_percent,
    }
}

fn validate_histogram_args(bins: usize, range: Option<(f64, f64)>) -> StacResult<()> {
    if bins == 0 {
        return Err(StacError::InvalidArgument(
            "Histogram bins must be a positive integer".to_string(),
        ));
    }
    if let Some((min, max)) = range {
        if !min.is_finite() || !max.is_finite() {
            return Err(StacError::InvalidArgument(format!(
                "Histogram range [{}, {}] is not finite",
                min, max
            )));
        }
        if min > max {
            return Err(StacError::InvalidArgument(format!(
                "Histogram range max must be larger than min, got [{}, {}]",
                min, max
            )));
        }
    }
    Ok(())
}

/// Equal-width histogram over `range` (data extent by default).
///
/// The last bin is closed on the right, values outside the range are ignored.
pub fn compute_histogram(
    values: &[f64],
    bins: usize,
    range: Option<(f64, f64)>,
) -> StacResult<Histogram> {
    validate_histogram_args(bins, range)?;

    let (mut first, mut last) = match range {
        Some(r) => r,
        None if values.is_empty() => (0.0, 1.0),
        None => (
            values.iter().copied().fold(f64::INFINITY, f64::min),
            values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        ),
    };
    if first == last {
        first -= 0.5;
        last += 0.5;
    }

    let step = (last - first) / bins as f64;
    let edge = |i: usize| if i == bins { last } else { first + i as f64 * step };

    let mut buckets = vec![0u64; bins];
    for &v in values {
        if v < first || v > last {
            continue;
        }
        let mut idx = (((v - first) / (last - first)) * bins as f64) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        // correct for rounding at the bin edges
        if v < edge(idx) && idx > 0 {
            idx -= 1;
        } else if idx + 1 < bins && v >= edge(idx + 1) {
            idx += 1;
        }
        buckets[idx] += 1;
    }

    Ok(Histogram {
        count: bins + 1,
        min: first,
        max: last,
        buckets,
    })
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

/// Histogram that falls back to `distinct + 1` bins over the data extent when
/// the band holds fewer distinct values than requested bins.
pub fn histogram_with_fallback(
    values: &[f64],
    bins: usize,
    range: Option<(f64, f64)>,
) -> StacResult<Histogram> {
    validate_histogram_args(bins, range)?;

    if !values.is_empty() {
        let distinct = count_distinct(values);
        if distinct < bins {
            log::warn!(
                "Could not calculate the histogram, fall back to automatic bin={}.",
                distinct + 1
            );
            return compute_histogram(values, distinct + 1, None);
        }
    }

    compute_histogram(values, bins, range)
}

/// Raster extension metadata for every band of a dataset
pub fn get_raster_info(
    handle: &dyn RasterHandle,
    max_size: usize,
    histogram_bins: usize,
    histogram_range: Option<(f64, f64)>,
) -> StacResult<Vec<RasterBand>> {
    let (width, height) = handle.size();
    let shape = read_shape(width, height, max_size);
    log::debug!(
        "Computing band statistics at {}x{} (source {}x{})",
        shape.1,
        shape.0,
        width,
        height
    );

    let sampling = handle
        .tag("AREA_OR_POINT", DEFAULT_DOMAIN)
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty());

    let mut bands = Vec::with_capacity(handle.band_count());
    for index in 1..=handle.band_count() {
        let info = handle.band_info(index)?;
        let nodata = info.nodata.map(Nodata::from_f64);

        let data = handle.read_band(index, shape)?;
        let values = valid_values(&data, nodata);
        let statistics = compute_statistics(&values, data.len());
        let histogram = histogram_with_fallback(&values, histogram_bins, histogram_range)?;

        log::debug!(
            "Band {}: {} valid pixels ({:.2}%)",
            index,
            values.len(),
            statistics.valid_percent
        );

        bands.push(RasterBand {
            name: format!("b{}", index),
            data_type: info.data_type,
            scale: info.scale,
            offset: info.offset,
            sampling: sampling.clone(),
            nodata,
            unit: info.unit.filter(|u| !u.is_empty()),
            statistics,
            histogram,
        });
    }

    Ok(bands)
}
