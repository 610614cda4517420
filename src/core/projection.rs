use crate::core::geometry::bbox_to_geom;
use crate::io::raster::RasterHandle;
use crate::stac::Geometry;
use crate::types::{Bbox, StacError, StacResult};
use gdal::spatial_ref::SpatialRef;
use serde_json::{Map, Value};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};

/// Projection extension metadata of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInfo {
    /// `AUTHORITY:CODE`, e.g. `EPSG:32633`
    pub code: Option<String>,
    pub geometry: Geometry,
    pub bbox: Bbox,
    /// `[height, width]`
    pub shape: [usize; 2],
    /// Affine coefficients `[a, b, c, d, e, f]`
    pub transform: [f64; 6],
    pub wkt2: Option<String>,
    pub projjson: Option<Value>,
}

impl ProjectionInfo {
    /// `proj:*` fields as written on an asset. The geometry is not included.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(
            "proj:code".to_string(),
            self.code.clone().map(Value::String).unwrap_or(Value::Null),
        );
        fields.insert("proj:bbox".to_string(), Value::from(self.bbox.to_array().to_vec()));
        fields.insert("proj:shape".to_string(), Value::from(self.shape.to_vec()));
        fields.insert("proj:transform".to_string(), Value::from(self.transform.to_vec()));
        if let Some(wkt2) = &self.wkt2 {
            fields.insert("proj:wkt2".to_string(), Value::String(wkt2.clone()));
        }
        if let Some(projjson) = &self.projjson {
            fields.insert("proj:projjson".to_string(), projjson.clone());
        }
        fields
    }
}

/// `AUTHORITY:CODE` of a CRS, trying EPSG identification when the CRS does
/// not carry an authority itself
pub fn authority_code(srs: &SpatialRef) -> Option<String> {
    if let (Ok(name), Ok(code)) = (srs.auth_name(), srs.auth_code()) {
        if !name.is_empty() {
            return Some(format!("{}:{}", name, code));
        }
    }

    let mut identified = srs.clone();
    if identified.auto_identify_epsg().is_ok() {
        if let Ok(code) = identified.auth_code() {
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

/// WKT2 (2019) representation of a CRS
pub fn export_wkt2(srs: &SpatialRef) -> StacResult<String> {
    let format = CString::new("FORMAT=WKT2_2019")
        .map_err(|e| StacError::Processing(e.to_string()))?;
    let options: [*const c_char; 2] = [format.as_ptr(), std::ptr::null()];
    let mut c_wkt: *mut c_char = std::ptr::null_mut();

    let rv = unsafe { gdal_sys::OSRExportToWktEx(srs.to_c_hsrs(), &mut c_wkt, options.as_ptr()) };

    let result = if rv != gdal_sys::OGRErr::OGRERR_NONE || c_wkt.is_null() {
        Err(StacError::Processing(format!(
            "OSRExportToWktEx failed with error code {}",
            rv
        )))
    } else {
        let wkt = unsafe { CStr::from_ptr(c_wkt) }.to_string_lossy().into_owned();
        if wkt.is_empty() {
            Err(StacError::Processing("Empty WKT2 export".to_string()))
        } else {
            Ok(wkt)
        }
    };

    if !c_wkt.is_null() {
        unsafe { gdal_sys::VSIFree(c_wkt as *mut c_void) };
    }
    result
}

/// PROJJSON representation of a CRS as a JSON object
pub fn export_projjson(srs: &SpatialRef) -> StacResult<Value> {
    let projjson = srs.to_projjson()?;
    Ok(serde_json::from_str(&projjson)?)
}

/// Projection extension metadata.
///
/// The CRS is described by its authority code when one resolves, else by
/// WKT2, else by PROJJSON. Export failures only log a warning.
pub fn get_projection_info(handle: &dyn RasterHandle) -> ProjectionInfo {
    let bbox = handle.bounds();
    let (width, height) = handle.size();
    let gt = handle.geo_transform();

    let mut info = ProjectionInfo {
        code: None,
        geometry: bbox_to_geom(&bbox),
        bbox,
        shape: [height, width],
        transform: [gt[1], gt[2], gt[0], gt[4], gt[5], gt[3]],
        wkt2: None,
        projjson: None,
    };

    let srs = match handle.crs() {
        Some(srs) => srs,
        None => return info,
    };

    info.code = authority_code(&srs);
    if info.code.is_some() {
        return info;
    }

    match export_wkt2(&srs) {
        Ok(wkt2) => info.wkt2 = Some(wkt2),
        Err(e) => {
            log::warn!("Could not get WKT2 from dataset : {}", e);
            match export_projjson(&srs) {
                Ok(projjson) => info.projjson = Some(projjson),
                Err(e) => log::warn!("Could not get PROJJSON from dataset : {}", e),
            }
        }
    }

    info
}
