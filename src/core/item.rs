use crate::core::antimeridian::fix_antimeridian;
use crate::core::asset::{build_asset, AssetOptions};
use crate::core::geometry::get_dataset_geom;
use crate::io::gcp::GcpView;
use crate::io::gdal_raster::GdalOpener;
use crate::io::raster::{RasterHandle, RasterOpener, Source, DEFAULT_DOMAIN, IMAGERY_DOMAIN};
use crate::stac::{collection_link, AssetExt, AssetMap, Item};
use crate::types::{StacError, StacResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use gdal::spatial_ref::SpatialRef;
use serde_json::{Map, Value};
use std::path::Path;
use std::str::FromStr;

pub const PROJECTION_EXTENSION: &str =
    "https://stac-extensions.github.io/projection/v2.0.0/schema.json";
pub const RASTER_EXTENSION: &str = "https://stac-extensions.github.io/raster/v2.0.0/schema.json";
pub const EO_EXTENSION: &str = "https://stac-extensions.github.io/eo/v2.0.0/schema.json";

/// Fields never kept on the thumbnail asset
const THUMBNAIL_STRIPPED_FIELDS: [&str; 5] = ["bands", "eo:bands", "raster:bands", "statistics", "stats"];

/// Parse a date or date-time.
///
/// Accepts RFC 3339, naive ISO 8601 date-times (taken as UTC), bare dates
/// and the TIFF `YYYY:MM:DD HH:MM:SS` form.
pub fn parse_datetime(value: &str) -> StacResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y:%m:%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(StacError::InvalidArgument(format!(
        "Could not parse datetime '{}'",
        value
    )))
}

/// Item datetime: a single instant or a `start/end` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatetimeInput {
    Instant(DateTime<Utc>),
    Range(DateTime<Utc>, DateTime<Utc>),
}

impl FromStr for DatetimeInput {
    type Err = StacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((start, end)) => Ok(DatetimeInput::Range(
                parse_datetime(start)?,
                parse_datetime(end)?,
            )),
            None => Ok(DatetimeInput::Instant(parse_datetime(s)?)),
        }
    }
}

/// Options for building an Item
#[derive(Clone)]
pub struct ItemOptions {
    pub datetime: Option<DatetimeInput>,
    pub extensions: Vec<String>,
    pub collection: Option<String>,
    pub collection_url: Option<String>,
    pub properties: Map<String, Value>,
    /// Merged into `_private` when `with_private` is set
    pub private_properties: Map<String, Value>,
    /// Defaults to the file name of the dataset
    pub id: Option<String>,
    /// Replaces the asset generated from the dataset when non-empty
    pub assets: Option<AssetMap>,
    pub asset_name: String,
    /// Generated asset options; the `with_*` flags also select extensions
    pub asset: AssetOptions,
    pub with_private: bool,
    pub geom_densify_pts: i32,
    pub geom_precision: i32,
    /// Footprint CRS, EPSG:4326 when `None`
    pub geographic_crs: Option<SpatialRef>,
}

impl Default for ItemOptions {
    fn default() -> Self {
        Self {
            datetime: None,
            extensions: Vec::new(),
            collection: None,
            collection_url: None,
            properties: Map::new(),
            private_properties: Map::new(),
            id: None,
            assets: None,
            asset_name: "asset".to_string(),
            asset: AssetOptions::default(),
            with_private: false,
            geom_densify_pts: 0,
            geom_precision: -1,
            geographic_crs: None,
        }
    }
}

fn non_empty_tag(handle: &dyn RasterHandle, key: &str, domain: &str) -> Option<String> {
    handle.tag(key, domain).filter(|v| !v.trim().is_empty())
}

/// Drop the keys of an ordered map rejected by `keep`, preserving order
fn retain_fields(fields: &mut Map<String, Value>, keep: impl Fn(&str) -> bool) {
    *fields = std::mem::take(fields)
        .into_iter()
        .filter(|(key, _)| keep(key))
        .collect();
}

/// Normalise the thumbnail asset and strip projection fields from metadata
/// assets
pub fn post_process_assets(assets: &mut AssetMap) {
    let thumb_key = assets
        .iter()
        .find(|(key, asset)| {
            asset.has_role("thumbnail") || key.ends_with("ql") || key.contains("-ql")
        })
        .map(|(key, _)| key.clone());

    if let Some(mut thumb) = thumb_key.and_then(|key| assets.shift_remove(&key)) {
        thumb.title = Some("thumbnail".to_string());
        thumb.description = Some("thumbnail".to_string());
        thumb.add_role("thumbnail");
        thumb.add_role("overview");

        thumb.additional_fields.insert("proj:code".to_string(), Value::Null);
        retain_fields(&mut thumb.additional_fields, |key| {
            !THUMBNAIL_STRIPPED_FIELDS.contains(&key)
                && (key == "proj:code" || !key.starts_with("proj:"))
        });

        assets.insert("thumbnail".to_string(), thumb);
    }

    for (_, asset) in assets.iter_mut() {
        if asset.has_role("metadata") {
            retain_fields(&mut asset.additional_fields, |key| !key.starts_with("proj:"));
        }
    }
}

/// Resolve the Item datetime from the options and the dataset tags
fn resolve_datetime(
    handle: &dyn RasterHandle,
    properties: &Map<String, Value>,
    input_datetime: Option<DateTime<Utc>>,
    has_range: bool,
) -> Option<DateTime<Utc>> {
    if has_range
        || properties.contains_key("start_datetime")
        || properties.contains_key("end_datetime")
    {
        return input_datetime;
    }

    let tag_date = non_empty_tag(handle, "ACQUISITIONDATETIME", IMAGERY_DOMAIN)
        .or_else(|| non_empty_tag(handle, "TIFFTAG_DATETIME", DEFAULT_DOMAIN));

    let dataset_datetime = tag_date.and_then(|date| match parse_datetime(&date) {
        Ok(dt) => Some(dt),
        Err(e) => {
            log::warn!("Could not get parse date: {}: {}", date, e);
            None
        }
    });

    Some(input_datetime.or(dataset_datetime).unwrap_or_else(Utc::now))
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Build a STAC Item from a path or an open raster, opening paths with GDAL
pub fn create_stac_item(source: Source<'_>, options: &ItemOptions) -> StacResult<Item> {
    create_stac_item_with(source, options, &GdalOpener)
}

/// [`create_stac_item`] with a custom opener
pub fn create_stac_item_with(
    source: Source<'_>,
    options: &ItemOptions,
    opener: &dyn RasterOpener,
) -> StacResult<Item> {
    let mut properties = options.properties.clone();
    let mut extensions = options.extensions.clone();

    let (input_datetime, range) = match options.datetime {
        Some(DatetimeInput::Instant(dt)) => (Some(dt), None),
        Some(DatetimeInput::Range(start, end)) => (None, Some((start, end))),
        None => (None, None),
    };

    let dataset = source.acquire(opener)?;
    log::info!("Creating STAC Item for {}", dataset.name());

    let gcps = dataset.gcps().filter(|gcps| !gcps.points.is_empty());
    let gcp_view = match &gcps {
        Some(gcps) => Some(GcpView::new(&*dataset, gcps)?),
        None => None,
    };
    let src_dst: &dyn RasterHandle = match &gcp_view {
        Some(view) => view,
        None => &*dataset,
    };

    let dataset_geom = get_dataset_geom(
        src_dst,
        options.geom_densify_pts,
        options.geom_precision,
        options.geographic_crs.as_ref(),
    )?;

    let datetime = resolve_datetime(src_dst, &properties, input_datetime, range.is_some());

    if let Some(satellite_id) = non_empty_tag(src_dst, "SATELLITEID", IMAGERY_DOMAIN) {
        if !properties.contains_key("platform") {
            properties.insert("platform".to_string(), Value::String(satellite_id));
        }
    }

    if options.asset.with_proj {
        extensions.push(PROJECTION_EXTENSION.to_string());
    }
    if options.asset.with_raster {
        extensions.push(RASTER_EXTENSION.to_string());
    }
    if options.asset.with_eo {
        extensions.push(EO_EXTENSION.to_string());

        if let Some(cloud_cover) = src_dst.tag("CLOUDCOVER", IMAGERY_DOMAIN) {
            match cloud_cover.trim().parse::<i64>() {
                Ok(value) => {
                    properties.insert("eo:cloud_cover".to_string(), Value::from(value));
                }
                Err(e) => log::warn!("Could not parse CLOUDCOVER '{}': {}", cloud_cover, e),
            }
        }
    }
    let extensions = dedup_preserving_order(extensions);

    let mut assets = match &options.assets {
        Some(assets) if !assets.is_empty() => assets.clone(),
        _ => {
            let (asset, _) = build_asset(&*dataset, &options.asset)?;
            AssetMap::from([(options.asset_name.clone(), asset)])
        }
    };

    let footprint = fix_antimeridian(&dataset_geom.footprint);
    let bbox = footprint.bounds().unwrap_or(dataset_geom.bbox);

    let id = options.id.clone().unwrap_or_else(|| {
        let name = dataset.name();
        Path::new(&name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(name)
    });

    if options.with_private {
        let private = properties
            .entry("_private")
            .or_insert_with(|| Value::Object(Map::new()));
        if private.is_null() {
            *private = Value::Object(Map::new());
        }
        let private = private.as_object_mut().ok_or_else(|| {
            StacError::InvalidArgument(
                "The `_private` property must be a JSON object when set.".to_string(),
            )
        })?;
        for (key, value) in &options.private_properties {
            private.insert(key.clone(), value.clone());
        }
        private
            .entry("hidden")
            .or_insert(Value::Bool(true));
    }

    post_process_assets(&mut assets);
    retain_fields(&mut properties, |key| !key.starts_with("proj:"));

    let mut item = Item::new(id);
    item.extensions = extensions;
    item.geometry = Some((&footprint).into());
    item.bbox = Some(::stac::Bbox::TwoDimensional(bbox.to_array()));
    item.properties.datetime = datetime;
    if let Some((start, end)) = range {
        item.properties.start_datetime = Some(start);
        item.properties.end_datetime = Some(end);
    }
    item.properties.additional_fields = properties;
    if let Some(collection) = &options.collection {
        item.links
            .push(collection_link(options.collection_url.as_deref().unwrap_or(collection)));
        item.collection = Some(collection.clone());
    }
    item.assets = assets.into_iter().collect();

    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{MemoryBand, MemoryOpener, MemoryRaster};
    use crate::io::raster::{GcpSet, GroundControlPoint};
    use crate::stac::{Asset, MediaType};
    use crate::testing::{capture_warnings, item_bbox};
    use crate::types::Bbox;
    use chrono::Datelike;
    use ndarray::Array2;
    use serde_json::json;

    fn raster(name: &str) -> MemoryRaster {
        let data = Array2::from_shape_fn((4, 4), |(i, j)| (i * 4 + j) as f64);
        MemoryRaster::new(name, 4, 4)
            .with_driver("GTiff")
            .with_band(MemoryBand::new(data).with_data_type("uint8"))
            .unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, hh, mm, ss).unwrap()
    }

    #[test]
    fn test_parse_datetime_forms() {
        let expected = utc(2021, 3, 4, 5, 6, 7);
        assert_eq!(parse_datetime("2021-03-04T05:06:07Z").unwrap(), expected);
        assert_eq!(parse_datetime("2021-03-04T07:06:07+02:00").unwrap(), expected);
        assert_eq!(parse_datetime("2021-03-04T05:06:07").unwrap(), expected);
        assert_eq!(parse_datetime("2021-03-04 05:06:07").unwrap(), expected);
        assert_eq!(parse_datetime("2021:03:04 05:06:07").unwrap(), expected);
        assert_eq!(parse_datetime("2021-03-04").unwrap(), utc(2021, 3, 4, 0, 0, 0));
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_datetime_input_from_str() {
        assert_eq!(
            "2020-01-01".parse::<DatetimeInput>().unwrap(),
            DatetimeInput::Instant(utc(2020, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            "2020-01-01/2020-01-02T12:00:00Z".parse::<DatetimeInput>().unwrap(),
            DatetimeInput::Range(utc(2020, 1, 1, 0, 0, 0), utc(2020, 1, 2, 12, 0, 0))
        );
        assert!("2020-01-01/nope".parse::<DatetimeInput>().is_err());
    }

    #[test]
    fn test_minimal_item_without_crs() {
        let raster = raster("/data/scene.tif")
            .with_tag("", "TIFFTAG_DATETIME", "2021:03:04 05:06:07");

        let (item, warnings) =
            capture_warnings(|| create_stac_item(Source::Handle(&raster), &ItemOptions::default()));
        let item = item.unwrap();

        assert_eq!(item.id, "scene.tif");
        assert_eq!(item_bbox(&item), Bbox::WORLD.to_array());
        assert_eq!(item.properties.datetime, Some(utc(2021, 3, 4, 5, 6, 7)));
        assert!(item.extensions.is_empty());
        assert!(item.links.is_empty());
        assert!(warnings.iter().any(|w| w.contains("CRS information")));

        let asset = item.assets.get("asset").unwrap();
        assert_eq!(asset.href, "/data/scene.tif");
        assert_eq!(asset.r#type.as_deref(), Some(MediaType::Tiff.as_str()));

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["properties"]["datetime"], "2021-03-04T05:06:07Z");
    }

    #[test]
    fn test_datetime_range_and_explicit_instant() {
        let raster = raster("scene.tif");
        let options = ItemOptions {
            datetime: Some("2020-01-01/2020-01-31".parse().unwrap()),
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();
        assert!(item.properties.datetime.is_none());
        assert_eq!(item.properties.start_datetime, Some(utc(2020, 1, 1, 0, 0, 0)));

        let value = serde_json::to_value(&item).unwrap();
        assert!(value["properties"]["datetime"].is_null());
        assert_eq!(value["properties"]["start_datetime"], "2020-01-01T00:00:00Z");
        assert_eq!(value["properties"]["end_datetime"], "2020-01-31T00:00:00Z");

        let options = ItemOptions {
            datetime: Some(DatetimeInput::Instant(utc(2019, 6, 1, 0, 0, 0))),
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();
        assert_eq!(item.properties.datetime, Some(utc(2019, 6, 1, 0, 0, 0)));
    }

    #[test]
    fn test_unparseable_tag_date_falls_back_to_now() {
        let raster = raster("scene.tif").with_tag("IMAGERY", "ACQUISITIONDATETIME", "not a date");

        let (item, warnings) =
            capture_warnings(|| create_stac_item(Source::Handle(&raster), &ItemOptions::default()));
        let item = item.unwrap();

        assert_eq!(item.properties.datetime.unwrap().year(), Utc::now().year());
        assert!(warnings.iter().any(|w| w.contains("not a date")));
    }

    #[test]
    fn test_imagery_tags_and_extensions() {
        let raster = raster("scene.tif")
            .with_tag("IMAGERY", "ACQUISITIONDATETIME", "2022-05-06T07:08:09Z")
            .with_tag("IMAGERY", "SATELLITEID", "SAT-1")
            .with_tag("IMAGERY", "CLOUDCOVER", "12");

        let options = ItemOptions {
            extensions: vec![EO_EXTENSION.to_string(), "https://example.com/ext.json".to_string()],
            asset: AssetOptions {
                with_raster: true,
                with_eo: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();

        assert_eq!(item.properties.datetime, Some(utc(2022, 5, 6, 7, 8, 9)));
        assert_eq!(item.properties.additional_fields["platform"], "SAT-1");
        assert_eq!(item.properties.additional_fields["eo:cloud_cover"], 12);
        assert_eq!(
            item.extensions,
            vec![
                EO_EXTENSION.to_string(),
                "https://example.com/ext.json".to_string(),
                RASTER_EXTENSION.to_string(),
            ]
        );

        let bands = item.assets.get("asset").unwrap().additional_fields["bands"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0]["name"], "b1");
    }

    #[test]
    fn test_platform_not_overridden() {
        let raster = raster("scene.tif").with_tag("IMAGERY", "SATELLITEID", "SAT-1");
        let mut properties = Map::new();
        properties.insert("platform".to_string(), json!("mine"));

        let options = ItemOptions {
            properties,
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();
        assert_eq!(item.properties.additional_fields["platform"], "mine");
    }

    #[test]
    fn test_private_properties() {
        let raster = raster("scene.tif");

        let options = ItemOptions {
            with_private: true,
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();
        assert_eq!(item.properties.additional_fields["_private"], json!({"hidden": true}));

        let mut properties = Map::new();
        properties.insert("_private".to_string(), json!({"hidden": false, "owner": "a"}));
        let mut private_properties = Map::new();
        private_properties.insert("owner".to_string(), json!("b"));
        let options = ItemOptions {
            with_private: true,
            properties,
            private_properties,
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();
        assert_eq!(
            item.properties.additional_fields["_private"],
            json!({"hidden": false, "owner": "b"})
        );

        let mut properties = Map::new();
        properties.insert("_private".to_string(), json!("secret"));
        let options = ItemOptions {
            with_private: true,
            properties,
            ..Default::default()
        };
        let result = create_stac_item(Source::Handle(&raster), &options);
        assert!(matches!(result, Err(StacError::InvalidArgument(_))));
    }

    #[test]
    fn test_collection_link() {
        let raster = raster("scene.tif");
        let options = ItemOptions {
            collection: Some("my-collection".to_string()),
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();
        assert_eq!(item.links.len(), 1);
        assert_eq!(item.links[0].rel, "collection");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["links"][0]["href"], "my-collection");
        assert_eq!(value["links"][0]["type"], "application/json");

        let options = ItemOptions {
            collection: Some("my-collection".to_string()),
            collection_url: Some("https://example.com/collection.json".to_string()),
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["links"][0]["href"], "https://example.com/collection.json");
        assert_eq!(value["collection"], "my-collection");
    }

    #[test]
    fn test_asset_post_processing() {
        let mut preview = Asset::new("preview-ql.jpg").with_roles(["overview"]);
        for (key, value) in [
            ("bands", json!([])),
            ("proj:shape", json!([10, 10])),
            ("proj:code", json!("EPSG:4326")),
            ("statistics", json!({})),
            ("custom", json!(1)),
        ] {
            preview.additional_fields.insert(key.to_string(), value);
        }

        let mut metadata = Asset::new("meta.xml").with_roles(["metadata"]);
        metadata.additional_fields.insert("proj:code".to_string(), json!("EPSG:4326"));
        metadata.additional_fields.insert("checksum".to_string(), json!("abc"));

        let mut data = Asset::new("data.tif").with_roles(["data"]);
        data.additional_fields.insert("proj:code".to_string(), json!("EPSG:32633"));

        let assets: AssetMap = [("data", data), ("preview-ql", preview), ("meta", metadata)]
            .into_iter()
            .map(|(key, asset)| (key.to_string(), asset))
            .collect();

        let mut properties = Map::new();
        properties.insert("proj:epsg".to_string(), json!(4326));
        properties.insert("keep".to_string(), json!(true));

        let raster = raster("scene.tif");
        let options = ItemOptions {
            assets: Some(assets),
            properties,
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();

        assert_eq!(item.assets.keys().collect::<Vec<_>>(), vec!["data", "meta", "thumbnail"]);
        assert!(item.assets.get("asset").is_none());

        let thumb = item.assets.get("thumbnail").unwrap();
        assert_eq!(thumb.title.as_deref(), Some("thumbnail"));
        assert_eq!(thumb.description.as_deref(), Some("thumbnail"));
        assert_eq!(thumb.roles, vec!["overview", "thumbnail"]);
        assert!(thumb.additional_fields["proj:code"].is_null());
        let thumb_keys: Vec<&str> = thumb.additional_fields.keys().map(String::as_str).collect();
        assert_eq!(thumb_keys, vec!["proj:code", "custom"]);

        let meta = item.assets.get("meta").unwrap();
        assert!(!meta.additional_fields.contains_key("proj:code"));
        assert_eq!(meta.additional_fields["checksum"], "abc");

        let data = item.assets.get("data").unwrap();
        assert_eq!(data.additional_fields["proj:code"], "EPSG:32633");

        assert!(!item.properties.additional_fields.contains_key("proj:epsg"));
        assert_eq!(item.properties.additional_fields["keep"], true);
    }

    #[test]
    fn test_generated_thumbnail_asset_is_renamed() {
        let raster = raster("scene.tif");
        let options = ItemOptions {
            asset_name: "scene-ql".to_string(),
            asset: AssetOptions {
                with_proj: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();

        let thumb = item.assets.get("thumbnail").unwrap();
        assert_eq!(thumb.roles, vec!["thumbnail", "overview"]);
        assert_eq!(thumb.additional_fields.keys().collect::<Vec<_>>(), vec!["proj:code"]);
        assert_eq!(item.extensions, vec![PROJECTION_EXTENSION.to_string()]);
    }

    #[test]
    fn test_negative_densify_rejected() {
        let raster = raster("scene.tif");
        let options = ItemOptions {
            geom_densify_pts: -2,
            ..Default::default()
        };
        let result = create_stac_item(Source::Handle(&raster), &options);
        assert!(matches!(result, Err(StacError::InvalidArgument(_))));
    }

    #[test]
    fn test_item_from_path_with_opener() {
        let mut opener = MemoryOpener::new();
        opener.register("/archive/2020/scene_b04.tif", raster("/archive/2020/scene_b04.tif"));

        let item = create_stac_item_with(
            Source::from("/archive/2020/scene_b04.tif"),
            &ItemOptions::default(),
            &opener,
        )
        .unwrap();
        assert_eq!(item.id, "scene_b04.tif");

        let missing = create_stac_item_with(Source::from("/nope.tif"), &ItemOptions::default(), &opener);
        assert!(matches!(missing, Err(StacError::SourceUnreadable(_))));
    }

    #[test]
    fn test_gcp_georeferenced_dataset() {
        let Ok(wgs84) = SpatialRef::from_epsg(4326) else {
            println!("EPSG database not available, skipping");
            return;
        };
        let gcp = |pixel: f64, line: f64, x: f64, y: f64| GroundControlPoint { pixel, line, x, y, z: 0.0 };
        let raster = raster("gcps.tif").with_gcps(GcpSet {
            points: vec![
                gcp(0.0, 0.0, 10.0, 50.0),
                gcp(4.0, 0.0, 14.0, 50.0),
                gcp(0.0, 4.0, 10.0, 46.0),
                gcp(4.0, 4.0, 14.0, 46.0),
            ],
            crs: Some(wgs84.clone()),
        });

        let options = ItemOptions {
            geographic_crs: Some(wgs84),
            ..Default::default()
        };
        let item = create_stac_item(Source::Handle(&raster), &options).unwrap();

        let bbox = item_bbox(&item);
        let expected = [10.0, 46.0, 14.0, 50.0];
        for (a, b) in bbox.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9, "{:?} != {:?}", bbox, expected);
        }
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["geometry"]["type"], "Polygon");
    }
}
