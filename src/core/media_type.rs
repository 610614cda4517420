use crate::io::raster::RasterHandle;
use crate::stac::MediaType;

/// GDAL drivers with a fixed media type
const DRIVER_MEDIA_TYPES: [(&str, MediaType); 13] = [
    ("JP2ECW", MediaType::Jpeg2000),
    ("JP2KAK", MediaType::Jpeg2000),
    ("JP2LURA", MediaType::Jpeg2000),
    ("JP2MrSID", MediaType::Jpeg2000),
    ("JP2OpenJPEG", MediaType::Jpeg2000),
    ("JPEG2000", MediaType::Jpeg2000),
    ("HDF4", MediaType::Hdf),
    ("HDF4Image", MediaType::Hdf),
    ("HDF5", MediaType::Hdf5),
    ("HDF5Image", MediaType::Hdf5),
    ("JPEG", MediaType::Jpeg),
    ("PNG", MediaType::Png),
    ("GTiff", MediaType::Geotiff),
];

/// Media type implied by a driver name; GeoTIFF needs a CRS, TIFF otherwise
pub fn media_type_for_driver(driver: &str, has_crs: bool) -> Option<MediaType> {
    let media_type = DRIVER_MEDIA_TYPES
        .iter()
        .find(|(name, _)| *name == driver)
        .map(|(_, media_type)| *media_type)?;

    match media_type {
        MediaType::Geotiff if !has_crs => Some(MediaType::Tiff),
        other => Some(other),
    }
}

/// Media type of a dataset from its driver, `None` (with a warning) for
/// drivers without a known type
pub fn get_media_type(handle: &dyn RasterHandle) -> Option<MediaType> {
    let driver = handle.driver();
    let media_type = media_type_for_driver(&driver, handle.crs().is_some());
    if media_type.is_none() {
        log::warn!("Could not determine the media type from GDAL driver {}.", driver);
    }
    media_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::MemoryRaster;
    use crate::testing::capture_warnings;

    #[test]
    fn test_driver_table() {
        assert_eq!(media_type_for_driver("GTiff", true), Some(MediaType::Geotiff));
        assert_eq!(media_type_for_driver("GTiff", false), Some(MediaType::Tiff));
        assert_eq!(media_type_for_driver("JP2OpenJPEG", true), Some(MediaType::Jpeg2000));
        assert_eq!(media_type_for_driver("HDF4Image", false), Some(MediaType::Hdf));
        assert_eq!(media_type_for_driver("HDF5", false), Some(MediaType::Hdf5));
        assert_eq!(media_type_for_driver("PNG", false), Some(MediaType::Png));
        assert_eq!(media_type_for_driver("JPEG", false), Some(MediaType::Jpeg));
        assert_eq!(media_type_for_driver("netCDF", true), None);
    }

    #[test]
    fn test_unknown_driver_warns() {
        let raster = MemoryRaster::new("test", 1, 1).with_driver("VRT");
        let (media_type, warnings) = capture_warnings(|| get_media_type(&raster));

        assert!(media_type.is_none());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("VRT"));
    }

    #[test]
    fn test_tiff_without_crs() {
        let raster = MemoryRaster::new("test", 1, 1).with_driver("GTiff");
        let (media_type, warnings) = capture_warnings(|| get_media_type(&raster));

        assert_eq!(media_type, Some(MediaType::Tiff));
        assert!(warnings.is_empty());
    }
}
