use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{DriverManager, Metadata};
use raster_stac::core::asset::{create_stac_asset, AssetOptions};
use raster_stac::core::item::{create_stac_item, ItemOptions, PROJECTION_EXTENSION};
use raster_stac::core::statistics::get_raster_info;
use raster_stac::io::gdal_raster::GdalRaster;
use raster_stac::io::raster::{RasterHandle, Source};
use raster_stac::stac::MediaType;
use raster_stac::StacError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a single-band uint8 GeoTIFF in UTM 33N, or `None` when GDAL lacks
/// the GTiff driver or the EPSG database
fn write_geotiff(dir: &Path, name: &str, size: usize) -> Option<PathBuf> {
    let Ok(driver) = DriverManager::get_driver_by_name("GTiff") else {
        println!("GTiff driver not available, skipping");
        return None;
    };
    let Ok(srs) = SpatialRef::from_epsg(32633) else {
        println!("EPSG database not available, skipping");
        return None;
    };

    let path = dir.join(name);
    let mut dataset = driver
        .create_with_band_type::<u8, _>(&path, size as _, size as _, 1)
        .expect("Failed to create GeoTIFF");
    dataset
        .set_geo_transform(&[500000.0, 10.0, 0.0, 5000000.0, 0.0, -10.0])
        .expect("Failed to set geotransform");
    dataset.set_spatial_ref(&srs).expect("Failed to set CRS");
    dataset
        .set_metadata_item("TIFFTAG_DATETIME", "2021:06:15 10:30:00", "")
        .expect("Failed to set metadata");

    let data: Vec<u8> = (0..size * size)
        .map(|i| ((i / size + i % size) % 200) as u8)
        .collect();
    let mut buffer = Buffer::new((size, size), data);
    let mut band = dataset.rasterband(1).expect("Failed to get band");
    band.write((0, 0), (size, size), &mut buffer)
        .expect("Failed to write band");

    Some(path)
}

#[test]
fn test_raster_info_from_geotiff() {
    let tmp = TempDir::new().unwrap();
    let Some(path) = write_geotiff(tmp.path(), "band.tif", 256) else {
        return;
    };

    let raster = GdalRaster::open(&path).expect("Failed to open GeoTIFF");
    assert_eq!(raster.size(), (256, 256));
    assert_eq!(raster.driver(), "GTiff");
    assert!(raster.crs().is_some());

    let bands = get_raster_info(&raster, 128, 10, None).expect("Failed to compute raster info");
    assert_eq!(bands.len(), 1);

    let band = &bands[0];
    assert_eq!(band.data_type, "uint8");
    assert!(band.nodata.is_none());
    assert!(matches!(band.sampling.as_deref(), Some("point") | Some("area")));
    assert_eq!(band.histogram.buckets.len(), 10);
    assert_eq!(band.statistics.valid_percent, 100.0);

    let value = serde_json::to_value(band).unwrap();
    assert!(value.get("nodata").is_none());
    assert_eq!(value["raster:histogram"]["count"], 11);
}

#[test]
fn test_asset_from_geotiff() {
    let tmp = TempDir::new().unwrap();
    let Some(path) = write_geotiff(tmp.path(), "band.tif", 64) else {
        return;
    };

    let options = AssetOptions {
        roles: vec!["data".to_string()],
        with_proj: true,
        with_raster: true,
        with_eo: true,
        ..Default::default()
    };
    let (asset, bands) = create_stac_asset(Source::from(path.as_path()), &options).unwrap();

    assert_eq!(asset.r#type.as_deref(), Some(MediaType::Geotiff.as_str()));
    assert_eq!(asset.additional_fields["proj:code"], "EPSG:32633");
    assert_eq!(asset.additional_fields["proj:shape"], serde_json::json!([64, 64]));
    assert_eq!(
        asset.additional_fields["proj:transform"],
        serde_json::json!([10.0, 0.0, 500000.0, 0.0, -10.0, 5000000.0])
    );
    assert_eq!(bands.len(), 1);
    assert_eq!(bands[0]["name"], "b1");
    assert_eq!(bands[0]["data_type"], "uint8");
}

#[test]
fn test_item_from_geotiff() {
    let tmp = TempDir::new().unwrap();
    let Some(path) = write_geotiff(tmp.path(), "scene.tif", 64) else {
        return;
    };

    let options = ItemOptions {
        asset: AssetOptions {
            with_proj: true,
            ..Default::default()
        },
        geom_densify_pts: 4,
        geom_precision: 6,
        ..Default::default()
    };
    let item = create_stac_item(Source::from(path.as_path()), &options).unwrap();

    assert_eq!(item.id, "scene.tif");
    assert_eq!(item.extensions, vec![PROJECTION_EXTENSION.to_string()]);

    // 640 m square just north of 45 N, east of the 15 E central meridian
    let value = serde_json::to_value(&item).unwrap();
    let bbox: [f64; 4] = serde_json::from_value(value["bbox"].clone()).unwrap();
    let [xmin, ymin, xmax, ymax] = bbox;
    assert!(xmin >= 15.0 && xmax < 15.1, "{:?}", bbox);
    assert!(ymin > 45.0 && ymax < 45.2, "{:?}", bbox);
    assert!(xmin < xmax && ymin < ymax);

    assert_eq!(value["properties"]["datetime"], "2021-06-15T10:30:00Z");
    assert!(value["properties"].get("proj:code").is_none());
    assert_eq!(value["assets"]["asset"]["proj:code"], "EPSG:32633");
    assert_eq!(value["geometry"]["type"], "Polygon");
}

#[test]
fn test_unreadable_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.txt");
    std::fs::write(&path, "not a raster").unwrap();

    let result = create_stac_item(Source::from(path.as_path()), &ItemOptions::default());
    assert!(matches!(result, Err(StacError::SourceUnreadable(_))));
}
