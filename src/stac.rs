//! Glue between the raster pipeline and the `stac` object model.
//!
//! Items, Assets and Links come from the `stac` crate. This module adds the
//! pieces it leaves to callers: the polygonal footprint type the geometry
//! code works on, the media type names accepted on the command line and a
//! few Asset helpers. Extension fields live in the ordered
//! `additional_fields` maps so that namespaced keys (`proj:*`, `eo:*`,
//! `raster:*`) serialize verbatim and in insertion order.

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::types::{Bbox, StacError, StacResult};

pub use ::stac::{Asset, Item, Link};

/// Insertion-ordered mapping of asset key to [`Asset`], as stored on
/// [`Item::assets`]. Inserting an existing key replaces the asset in place.
pub type AssetMap = IndexMap<String, Asset>;

/// A `[x, y]` coordinate
pub type Position = [f64; 2];

/// A closed linear ring
pub type Ring = Vec<Position>;

/// Footprint geometry, restricted to the polygonal types a footprint can
/// take. Converted to GeoJSON when placed on an [`Item`].
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Iterate over every position of every ring
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            Geometry::Polygon(rings) => Box::new(rings.iter().flatten()),
            Geometry::MultiPolygon(polygons) => {
                Box::new(polygons.iter().flatten().flatten())
            }
        }
    }

    /// Tight bounds of the geometry
    pub fn bounds(&self) -> Option<Bbox> {
        Bbox::from_positions(self.positions())
    }
}

impl From<&Geometry> for geojson::Geometry {
    fn from(geometry: &Geometry) -> Self {
        let polygon = |rings: &Vec<Ring>| -> geojson::PolygonType {
            rings
                .iter()
                .map(|ring| ring.iter().map(|p| p.to_vec()).collect())
                .collect()
        };
        let value = match geometry {
            Geometry::Polygon(rings) => geojson::Value::Polygon(polygon(rings)),
            Geometry::MultiPolygon(polygons) => {
                geojson::Value::MultiPolygon(polygons.iter().map(&polygon).collect())
            }
        };
        geojson::Geometry::new(value)
    }
}

/// Media types known to the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Cog,
    Geotiff,
    Tiff,
    Jpeg2000,
    Png,
    Jpeg,
    Xml,
    Json,
    GeoJson,
    GeoPackage,
    Hdf,
    Hdf5,
    Text,
    Html,
}

impl MediaType {
    pub const ALL: [MediaType; 14] = [
        MediaType::Cog,
        MediaType::Geotiff,
        MediaType::Tiff,
        MediaType::Jpeg2000,
        MediaType::Png,
        MediaType::Jpeg,
        MediaType::Xml,
        MediaType::Json,
        MediaType::GeoJson,
        MediaType::GeoPackage,
        MediaType::Hdf,
        MediaType::Hdf5,
        MediaType::Text,
        MediaType::Html,
    ];

    /// IANA media type string
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Cog => "image/tiff; application=geotiff; profile=cloud-optimized",
            MediaType::Geotiff => "image/tiff; application=geotiff",
            MediaType::Tiff => "image/tiff",
            MediaType::Jpeg2000 => "image/jp2",
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Xml => "application/xml",
            MediaType::Json => "application/json",
            MediaType::GeoJson => "application/geo+json",
            MediaType::GeoPackage => "application/geopackage+sqlite3",
            MediaType::Hdf => "application/x-hdf",
            MediaType::Hdf5 => "application/x-hdf5",
            MediaType::Text => "text/plain",
            MediaType::Html => "text/html",
        }
    }

    /// Short upper-case name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            MediaType::Cog => "COG",
            MediaType::Geotiff => "GEOTIFF",
            MediaType::Tiff => "TIFF",
            MediaType::Jpeg2000 => "JPEG2000",
            MediaType::Png => "PNG",
            MediaType::Jpeg => "JPEG",
            MediaType::Xml => "XML",
            MediaType::Json => "JSON",
            MediaType::GeoJson => "GEOJSON",
            MediaType::GeoPackage => "GEOPACKAGE",
            MediaType::Hdf => "HDF",
            MediaType::Hdf5 => "HDF5",
            MediaType::Text => "TEXT",
            MediaType::Html => "HTML",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = StacError;

    /// Accepts either the short name (`GEOTIFF`, case-insensitive) or the full
    /// media type string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MediaType::ALL
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(s) || m.as_str() == s)
            .copied()
            .ok_or_else(|| StacError::InvalidArgument(format!("Unknown media type: {}", s)))
    }
}

/// Builder-style helpers on [`Asset`]
pub trait AssetExt: Sized {
    fn with_media_type(self, media_type: Option<String>) -> Self;

    /// Append roles, skipping any already present
    fn with_roles<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>;

    /// Append a role unless already present
    fn add_role(&mut self, role: impl Into<String>);

    fn has_role(&self, role: &str) -> bool;
}

impl AssetExt for Asset {
    fn with_media_type(mut self, media_type: Option<String>) -> Self {
        self.r#type = media_type;
        self
    }

    fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for role in roles {
            self.add_role(role);
        }
        self
    }

    fn add_role(&mut self, role: impl Into<String>) {
        let role = role.into();
        if !self.has_role(&role) {
            self.roles.push(role);
        }
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// `collection` link to a parent Collection document
pub fn collection_link(href: &str) -> Link {
    let mut link = Link::new(href.to_string(), "collection");
    link.r#type = Some(MediaType::Json.as_str().to_string());
    link
}

/// Write an Item as compact JSON
pub fn write_item(item: &Item, path: &Path) -> StacResult<()> {
    let json = serde_json::to_string(item)?;
    std::fs::write(path, json)?;
    Ok(())
}
