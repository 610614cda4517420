//! Antimeridian correction of geographic footprints.
//!
//! A polygon whose edges jump by more than 180 degrees of longitude is cut at
//! ±180 and the pieces are re-joined along the antimeridian, going over a pole
//! when the ring encloses one. Exterior rings are made counter-clockwise
//! first; interior rings of crossing polygons are dropped.

use crate::stac::{Geometry, Position, Ring};

/// Split polygons crossing the antimeridian
pub fn fix_antimeridian(geometry: &Geometry) -> Geometry {
    let polygons: Vec<Vec<Ring>> = match geometry {
        Geometry::Polygon(rings) => fix_polygon(rings),
        Geometry::MultiPolygon(polygons) => polygons.iter().flat_map(|p| fix_polygon(p)).collect(),
    };

    match geometry {
        Geometry::Polygon(_) if polygons.len() == 1 => {
            Geometry::Polygon(polygons.into_iter().next().unwrap_or_default())
        }
        _ => Geometry::MultiPolygon(polygons),
    }
}

fn crosses(ring: &[Position]) -> bool {
    ring.windows(2).any(|w| (w[1][0] - w[0][0]).abs() > 180.0)
}

fn normalize_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Net longitude winding of a ring (0 unless it encloses a pole) and the
/// signed shoelace area of its unwrapped coordinates
fn winding_and_area(ring: &[Position]) -> (f64, f64) {
    let mut unwrapped: Vec<Position> = Vec::with_capacity(ring.len());
    let mut shift = 0.0;
    for (i, p) in ring.iter().enumerate() {
        if i > 0 {
            let dx = p[0] - ring[i - 1][0];
            if dx > 180.0 {
                shift -= 360.0;
            } else if dx < -180.0 {
                shift += 360.0;
            }
        }
        unwrapped.push([p[0] + shift, p[1]]);
    }

    let area = unwrapped
        .windows(2)
        .map(|w| w[0][0] * w[1][1] - w[1][0] * w[0][1])
        .sum::<f64>()
        / 2.0;
    (shift, area)
}

fn crossing_latitude(a: Position, b: Position, lon: f64) -> f64 {
    if b[0] == a[0] {
        return a[1];
    }
    a[1] + (b[1] - a[1]) * (lon - a[0]) / (b[0] - a[0])
}

fn dedup(ring: &mut Ring) {
    ring.dedup_by(|a, b| a == b);
}

/// Cut a closed ring into open segments, each starting and ending on ±180
fn split_ring(ring: &[Position]) -> Vec<Ring> {
    let mut segments: Vec<Ring> = Vec::new();
    let mut current: Ring = vec![ring[0]];

    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        let dx = b[0] - a[0];
        if dx < -180.0 {
            // eastward over +180
            let lat = crossing_latitude(a, [b[0] + 360.0, b[1]], 180.0);
            current.push([180.0, lat]);
            segments.push(std::mem::take(&mut current));
            current = vec![[-180.0, lat], b];
        } else if dx > 180.0 {
            // westward over -180
            let lat = crossing_latitude(a, [b[0] - 360.0, b[1]], -180.0);
            current.push([-180.0, lat]);
            segments.push(std::mem::take(&mut current));
            current = vec![[180.0, lat], b];
        } else {
            current.push(b);
        }
    }

    if segments.is_empty() {
        return vec![current];
    }

    // the ring start lies inside a segment: join the tail back onto the head
    let head = segments.remove(0);
    current.extend(head.into_iter().skip(1));
    segments.push(current);

    for segment in segments.iter_mut() {
        dedup(segment);
    }
    segments
}

/// Position along the antimeridian walked counter-clockwise: up the +180
/// side from the south pole, then down the -180 side
fn boundary_param(p: &Position) -> f64 {
    if p[0] > 0.0 {
        p[1] + 90.0
    } else {
        270.0 - p[1]
    }
}

/// Corners inserted when walking from `from` to `to` (counter-clockwise)
fn pole_corners(from: f64, to: f64) -> Vec<Position> {
    let distance = (to - from).rem_euclid(360.0);
    let mut corners: Vec<(f64, [Position; 2])> = Vec::new();

    let to_north = (180.0 - from).rem_euclid(360.0);
    if to_north < distance {
        corners.push((to_north, [[180.0, 90.0], [-180.0, 90.0]]));
    }
    let to_south = (360.0 - from).rem_euclid(360.0);
    if to_south < distance {
        corners.push((to_south, [[-180.0, -90.0], [180.0, -90.0]]));
    }

    corners.sort_by(|a, b| a.0.total_cmp(&b.0));
    corners.into_iter().flat_map(|(_, c)| c).collect()
}

fn stitch(segments: Vec<Ring>) -> Vec<Ring> {
    let n = segments.len();
    let mut used = vec![false; n];
    let mut rings = Vec::new();

    for start in 0..n {
        if used[start] {
            continue;
        }
        let mut ring: Ring = Vec::new();
        let mut idx = start;
        loop {
            used[idx] = true;
            ring.extend_from_slice(&segments[idx]);

            let end = match ring.last() {
                Some(p) => boundary_param(p),
                None => break,
            };
            let next = (0..n)
                .filter(|&j| !used[j] || j == start)
                .min_by(|&a, &b| {
                    let da = (boundary_param(&segments[a][0]) - end).rem_euclid(360.0);
                    let db = (boundary_param(&segments[b][0]) - end).rem_euclid(360.0);
                    da.total_cmp(&db)
                })
                .unwrap_or(start);

            ring.extend(pole_corners(end, boundary_param(&segments[next][0])));
            if next == start {
                ring.push(ring[0]);
                break;
            }
            idx = next;
        }
        dedup(&mut ring);
        rings.push(ring);
    }
    rings
}

fn fix_polygon(rings: &[Ring]) -> Vec<Vec<Ring>> {
    let exterior = match rings.first() {
        Some(ring) if ring.len() >= 4 => ring,
        _ => return vec![rings.to_vec()],
    };

    let mut exterior: Ring = exterior.iter().map(|p| [normalize_lon(p[0]), p[1]]).collect();
    if !crosses(&exterior) {
        return vec![rings.to_vec()];
    }
    let (winding, area) = winding_and_area(&exterior);
    if winding == 0.0 && area < 0.0 {
        exterior.reverse();
    }

    log::debug!("Splitting footprint at the antimeridian");
    stitch(split_ring(&exterior))
        .into_iter()
        .map(|ring| vec![ring])
        .collect()
}
