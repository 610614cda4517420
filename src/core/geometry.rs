use crate::io::raster::RasterHandle;
use crate::stac::{Geometry, Position, Ring};
use crate::types::{Bbox, StacError, StacResult};
use gdal::spatial_ref::{CoordTransform, SpatialRef};

/// Footprint of a dataset in geographic coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetGeometry {
    pub bbox: Bbox,
    pub footprint: Geometry,
}

/// Closed counter-clockwise rectangle of a bounding box
pub fn bbox_to_geom(bbox: &Bbox) -> Geometry {
    Geometry::Polygon(vec![vec![
        [bbox.xmin, bbox.ymin],
        [bbox.xmax, bbox.ymin],
        [bbox.xmax, bbox.ymax],
        [bbox.xmin, bbox.ymax],
        [bbox.xmin, bbox.ymin],
    ]])
}

/// Resample a ring by linear interpolation, placing `densify_pts - 1` extra
/// vertices on every edge. `0` and `1` leave the ring unchanged.
pub fn densify_ring(ring: &[Position], densify_pts: usize) -> Ring {
    if densify_pts <= 1 || ring.len() < 2 {
        return ring.to_vec();
    }

    let last = (ring.len() - 1) * densify_pts;
    (0..=last)
        .map(|t| {
            let segment = t / densify_pts;
            if segment == ring.len() - 1 {
                return ring[segment];
            }
            let frac = (t % densify_pts) as f64 / densify_pts as f64;
            let (a, b) = (ring[segment], ring[segment + 1]);
            [a[0] + (b[0] - a[0]) * frac, a[1] + (b[1] - a[1]) * frac]
        })
        .collect()
}

/// EPSG:4326, the default target of footprints
pub fn epsg_4326() -> StacResult<SpatialRef> {
    Ok(SpatialRef::from_epsg(4326)?)
}

/// Copy of `srs` using x/y (lon/lat) axis order whatever its authority says
pub fn traditional_gis_order(srs: &SpatialRef) -> SpatialRef {
    let srs = srs.clone();
    srs.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    srs
}

fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    (value * factor).round() / factor
}

/// Transform every vertex of a ring
pub fn reproject_ring(ring: &[Position], transform: &CoordTransform) -> StacResult<Ring> {
    let mut xs: Vec<f64> = ring.iter().map(|p| p[0]).collect();
    let mut ys: Vec<f64> = ring.iter().map(|p| p[1]).collect();
    let mut zs = vec![0.0; ring.len()];

    transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

    Ok(xs.into_iter().zip(ys).map(|(x, y)| [x, y]).collect())
}

fn map_rings<F>(geometry: &Geometry, f: F) -> StacResult<Geometry>
where
    F: Fn(&Ring) -> StacResult<Ring>,
{
    match geometry {
        Geometry::Polygon(rings) => Ok(Geometry::Polygon(
            rings.iter().map(&f).collect::<StacResult<_>>()?,
        )),
        Geometry::MultiPolygon(polygons) => Ok(Geometry::MultiPolygon(
            polygons
                .iter()
                .map(|rings| rings.iter().map(&f).collect::<StacResult<Vec<_>>>())
                .collect::<StacResult<_>>()?,
        )),
    }
}

/// Round every vertex to `precision` decimals. A negative precision leaves
/// the geometry untouched.
pub fn round_geometry(geometry: &Geometry, precision: i32) -> Geometry {
    if precision < 0 {
        return geometry.clone();
    }
    let round_ring = |ring: &Ring| -> Ring {
        ring.iter()
            .map(|p| [round_to(p[0], precision), round_to(p[1], precision)])
            .collect()
    };
    match geometry {
        Geometry::Polygon(rings) => Geometry::Polygon(rings.iter().map(&round_ring).collect()),
        Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(
            polygons
                .iter()
                .map(|rings| rings.iter().map(&round_ring).collect())
                .collect(),
        ),
    }
}

/// Reproject a polygonal geometry, rounding coordinates to `precision`
/// decimals when `precision >= 0`
pub fn reproject_geometry(
    geometry: &Geometry,
    src: &SpatialRef,
    dst: &SpatialRef,
    precision: i32,
) -> StacResult<Geometry> {
    let transform = CoordTransform::new(&traditional_gis_order(src), &traditional_gis_order(dst))?;
    let reprojected = map_rings(geometry, |ring| reproject_ring(ring, &transform))?;
    Ok(round_geometry(&reprojected, precision))
}

/// Footprint and bounding box of a dataset in `geographic_crs`
/// (EPSG:4326 when `None`).
///
/// A dataset without CRS gets the whole-globe box and a warning.
pub fn get_dataset_geom(
    handle: &dyn RasterHandle,
    densify_pts: i32,
    precision: i32,
    geographic_crs: Option<&SpatialRef>,
) -> StacResult<DatasetGeometry> {
    if densify_pts < 0 {
        return Err(StacError::InvalidArgument(
            "`densify_pts` must be positive".to_string(),
        ));
    }

    let src_crs = match handle.crs() {
        Some(crs) => crs,
        None => {
            log::warn!(
                "Input file doesn't have CRS information, setting geometry and bbox to (-180,-90,180,90)."
            );
            return Ok(DatasetGeometry {
                bbox: Bbox::WORLD,
                footprint: bbox_to_geom(&Bbox::WORLD),
            });
        }
    };

    let default_crs;
    let dst_crs = match geographic_crs {
        Some(crs) => crs,
        None => {
            default_crs = epsg_4326()?;
            &default_crs
        }
    };

    let bounds = handle.bounds();
    let footprint = bbox_to_geom(&bounds);

    let footprint = if src_crs == *dst_crs {
        round_geometry(&footprint, precision)
    } else {
        let footprint = match footprint {
            Geometry::Polygon(rings) if densify_pts > 0 => Geometry::Polygon(
                rings
                    .iter()
                    .map(|ring| densify_ring(ring, densify_pts as usize))
                    .collect(),
            ),
            other => other,
        };
        reproject_geometry(&footprint, &src_crs, dst_crs, precision)?
    };

    let bbox = footprint
        .bounds()
        .ok_or_else(|| StacError::Processing("Empty footprint".to_string()))?;

    log::debug!("Dataset footprint bbox: {:?}", bbox.to_array());
    Ok(DatasetGeometry { bbox, footprint })
}
