//! Directory asset collection.
//!
//! Walks a directory (plus any explicit paths) and turns every usable file
//! into a STAC asset: metadata documents, quicklook thumbnails and rasters.

use crate::core::asset::{build_asset, AssetOptions};
use crate::io::gdal_raster::GdalOpener;
use crate::io::raster::RasterOpener;
use crate::stac::{Asset, AssetExt, AssetMap, MediaType};
use glob::Pattern;
use std::cmp::Ordering;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use walkdir::{DirEntry, WalkDir};

/// Options for [`build_stac_assets`]
#[derive(Debug, Clone, PartialEq)]
pub struct CollectOptions {
    pub directory: Option<PathBuf>,
    /// Files collected before the directory walk
    pub paths: Vec<PathBuf>,
    /// Glob filters; a file is kept when it matches any of them
    pub patterns: Vec<String>,
    /// Raster asset options. `roles` and `href` are set per file.
    pub asset: AssetOptions,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            directory: None,
            paths: Vec::new(),
            patterns: Vec::new(),
            asset: AssetOptions {
                with_proj: true,
                ..Default::default()
            },
        }
    }
}

impl CollectOptions {
    pub fn for_directory<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: Some(directory.as_ref().to_path_buf()),
            ..Default::default()
        }
    }
}

/// What a collected file turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Metadata(MediaType),
    Quicklook,
    Raster,
}

fn classify(path: &Path) -> FileKind {
    let lower = path.to_string_lossy().to_lowercase();
    if lower.ends_with(".json") {
        FileKind::Metadata(MediaType::Json)
    } else if lower.ends_with(".xml") || lower.ends_with(".safe") {
        FileKind::Metadata(MediaType::Xml)
    } else if lower.ends_with("ql.jpg") || lower.ends_with("ql.jpeg") {
        FileKind::Quicklook
    } else {
        FileKind::Raster
    }
}

/// Files before sub-directories, each group by name
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn walk_directory(directory: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory).sort_by(files_first) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        files.push(entry.into_path());
    }
    files
}

fn relative_to<'p>(path: &'p Path, directory: Option<&Path>) -> &'p Path {
    directory
        .and_then(|dir| path.strip_prefix(dir).ok())
        .unwrap_or(path)
}

fn matches_patterns(path: &Path, directory: Option<&Path>, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return true;
    }

    let relative = relative_to(path, directory).to_string_lossy();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    patterns.iter().any(|pattern| {
        let source = pattern.as_str();
        if source.contains('/') || source.contains(MAIN_SEPARATOR) {
            pattern.matches(&relative)
        } else {
            pattern.matches(&file_name)
        }
    })
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("Ignoring invalid pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

/// Build assets from a directory and/or explicit paths, opening rasters with
/// GDAL
pub fn build_stac_assets(options: &CollectOptions) -> AssetMap {
    build_stac_assets_with(options, &GdalOpener)
}

/// [`build_stac_assets`] with a custom opener
pub fn build_stac_assets_with(options: &CollectOptions, opener: &dyn RasterOpener) -> AssetMap {
    let directory = options.directory.as_deref();

    let mut files = options.paths.clone();
    if let Some(directory) = directory {
        files.extend(walk_directory(directory));
    }

    let patterns = compile_patterns(&options.patterns);
    let mut assets = AssetMap::new();

    for path in files
        .iter()
        .filter(|path| matches_patterns(path, directory, &patterns))
    {
        if !path.is_file() {
            continue;
        }

        let href = match directory.and_then(|dir| path.strip_prefix(dir).ok()) {
            Some(relative) => relative.to_string_lossy().into_owned(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let key = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let asset = match classify(path) {
            FileKind::Metadata(media_type) => Asset::new(href)
                .with_media_type(Some(media_type.as_str().to_string()))
                .with_roles(["metadata"]),
            FileKind::Quicklook => Asset::new(href)
                .with_media_type(Some(MediaType::Jpeg.as_str().to_string()))
                .with_roles(["thumbnail"]),
            FileKind::Raster => {
                let handle = match opener.open(path) {
                    Ok(handle) => handle,
                    Err(e) => {
                        log::debug!("Skipping {}: {}", path.display(), e);
                        continue;
                    }
                };

                let role = if handle.crs().is_none() && handle.band_count() == 3 {
                    "thumbnail"
                } else {
                    "data"
                };
                let asset_options = AssetOptions {
                    roles: vec![role.to_string()],
                    href: Some(href),
                    ..options.asset.clone()
                };

                match build_asset(&*handle, &asset_options) {
                    Ok((asset, _)) => asset,
                    Err(e) => {
                        log::debug!("Skipping {}: {}", path.display(), e);
                        continue;
                    }
                }
            }
        };

        log::debug!("Collected asset '{}' from {}", key, path.display());
        assets.insert(key, asset);
    }

    log::info!("Collected {} assets", assets.len());
    assets
}
