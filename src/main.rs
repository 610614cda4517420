//! raster-stac command line: create a STAC Item for a raster dataset or a
//! directory of related files.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use raster_stac::core::asset::{AssetOptions, MediaTypeOption};
use raster_stac::core::item::{create_stac_item, DatetimeInput, ItemOptions};
use raster_stac::core::statistics::{DEFAULT_HISTOGRAM_BINS, DEFAULT_MAX_SIZE};
use raster_stac::io::collector::{build_stac_assets, CollectOptions};
use raster_stac::io::raster::Source;
use raster_stac::stac::{write_item, AssetExt, AssetMap, MediaType};
use raster_stac::StacError;

#[derive(Debug, Parser)]
#[command(name = "raster-stac", version, about = "Create a STAC Item for a raster dataset.")]
struct Args {
    /// Input raster file, or directory with --recursive
    input: PathBuf,

    /// The date and time of the assets, in UTC (e.g 2020-01-01, 2020-01-01T01:01:01),
    /// or a start/end range
    #[arg(short = 'd', long = "datetime", value_parser = parse_datetime_arg)]
    datetime: Option<DatetimeInput>,

    /// STAC extension URL the Item implements
    #[arg(short = 'e', long = "extension")]
    extensions: Vec<String>,

    /// The Collection ID that this item belongs to
    #[arg(short = 'c', long)]
    collection: Option<String>,

    /// Link to the STAC Collection
    #[arg(long)]
    collection_url: Option<String>,

    /// Additional property to add. JSON values allowed for nested data.
    #[arg(short = 'p', long = "property", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    properties: Vec<(String, String)>,

    /// Additional property to add under '_private' without JSON braces
    #[arg(short = 'P', long = "private-property", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    private_properties: Vec<(String, String)>,

    /// Item id
    #[arg(long)]
    id: Option<String>,

    /// Asset name
    #[arg(short = 'n', long, default_value = "asset")]
    asset_name: String,

    /// Overwrite asset href
    #[arg(long)]
    asset_href: Option<String>,

    /// Asset media-type name (GEOTIFF, COG, JPEG2000, ...) or auto
    #[arg(long, default_value = "auto", value_parser = parse_media_type)]
    asset_mediatype: MediaTypeOption,

    /// Add the 'projection' extension and properties [default]
    #[arg(long, overrides_with = "without_proj")]
    with_proj: bool,
    #[arg(long, overrides_with = "with_proj")]
    without_proj: bool,

    /// Add the 'raster' extension and properties [default]
    #[arg(long, overrides_with = "without_raster")]
    with_raster: bool,
    #[arg(long, overrides_with = "with_raster")]
    without_raster: bool,

    /// Add the 'eo' extension and properties [default]
    #[arg(long, overrides_with = "without_eo")]
    with_eo: bool,
    #[arg(long, overrides_with = "with_eo")]
    without_eo: bool,

    /// Add the '_private' entry to output item. Implicitly enabled if -P or
    /// -p _private=... is used.
    #[arg(long = "with-private-data", overrides_with = "without_private_data")]
    with_private_data: bool,
    #[arg(long = "without-private-data", overrides_with = "with_private_data")]
    without_private_data: bool,

    /// Limit array size from which to get the raster statistics
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    max_raster_size: usize,

    /// Densifies the number of points on each edges of the polygon geometry
    #[arg(long, default_value_t = 0)]
    densify_geom: i32,

    /// Round geometry coordinates to this number of decimal, -1 keeps full precision
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    geom_precision: i32,

    /// Output file name
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// GDAL configuration options
    #[arg(long = "config", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    config: Vec<(String, String)>,

    /// Process input directory recursively
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Glob pattern to filter files when using --recursive
    #[arg(long = "pattern")]
    patterns: Vec<String>,
}

/// Resolve a `--with-x/--without-x` pair
fn flag(with: bool, without: bool, default: bool) -> bool {
    if with {
        true
    } else if without {
        false
    } else {
        default
    }
}

fn parse_key_val(pair: &str) -> Result<(String, String), String> {
    pair.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("Invalid syntax for KEY=VAL arg: {}", pair))
}

fn parse_datetime_arg(value: &str) -> Result<DatetimeInput, String> {
    value.parse::<DatetimeInput>().map_err(|e| e.to_string())
}

fn parse_media_type(value: &str) -> Result<MediaTypeOption, String> {
    value.parse::<MediaTypeOption>().map_err(|_| {
        let names: Vec<&str> = MediaType::ALL.iter().map(|m| m.name()).collect();
        format!("expected one of {}, auto", names.join(", "))
    })
}

/// Parse a JSON-ish value: plain JSON, JSON with single quotes, or an
/// object/array with unquoted keys. Anything else stays a string.
fn parse_jsonish(value: &str) -> Value {
    let stripped = value.trim();
    let single_quoted = stripped.replace('\'', "\"");
    let mut candidates = vec![stripped.to_string(), single_quoted.clone()];

    if stripped.starts_with('{') || stripped.starts_with('[') {
        if let Ok(unquoted_key) = Regex::new(r"(?P<lead>[{,]\s*)(?P<key>[A-Za-z_][A-Za-z0-9_-]*)\s*:") {
            candidates.push(unquoted_key.replace_all(stripped, "${lead}\"${key}\":").into_owned());
            candidates.push(
                unquoted_key
                    .replace_all(&single_quoted, "${lead}\"${key}\":")
                    .into_owned(),
            );
        }
    }

    candidates
        .iter()
        .find_map(|candidate| serde_json::from_str(candidate).ok())
        .unwrap_or_else(|| Value::String(value.to_string()))
}

/// Collect NAME=VALUE pairs; object values given twice for a key are merged
fn collect_properties(pairs: &[(String, String)]) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, raw) in pairs {
        let parsed = parse_jsonish(raw);
        let merged = match (out.get_mut(key), &parsed) {
            (Some(Value::Object(existing)), Value::Object(update)) => {
                for (k, v) in update {
                    existing.insert(k.clone(), v.clone());
                }
                true
            }
            _ => false,
        };
        if !merged {
            out.insert(key.clone(), parsed);
        }
    }
    out
}

/// Item geometry source for a collected directory: the first data asset,
/// else the first non-metadata asset
fn directory_source(input: &Path, assets: &AssetMap) -> Option<PathBuf> {
    assets
        .iter()
        .find(|(_, asset)| asset.has_role("data"))
        .or_else(|| assets.iter().find(|(_, asset)| !asset.has_role("metadata")))
        .map(|(_, asset)| input.join(&asset.href))
}

fn run(args: Args) -> Result<()> {
    let mut properties = collect_properties(&args.properties);
    let private_properties = collect_properties(&args.private_properties);

    let mut with_private = flag(args.with_private_data, args.without_private_data, false);
    if let Some(private) = properties.get("_private") {
        if !private.is_object() {
            bail!("When provided, '_private' must be a JSON object.");
        }
        with_private = true;
    }
    if !private_properties.is_empty() {
        with_private = true;
    }
    if with_private {
        properties
            .entry("_private")
            .or_insert_with(|| Value::Object(Map::new()));
    }

    for (key, value) in &args.config {
        gdal::config::set_config_option(key, value)
            .with_context(|| format!("Could not set GDAL configuration option {}", key))?;
    }

    let asset = AssetOptions {
        media_type: args.asset_mediatype.clone(),
        with_proj: flag(args.with_proj, args.without_proj, true),
        with_raster: flag(args.with_raster, args.without_raster, true),
        with_eo: flag(args.with_eo, args.without_eo, true),
        raster_max_size: args.max_raster_size,
        histogram_bins: DEFAULT_HISTOGRAM_BINS,
        ..Default::default()
    };

    let mut options = ItemOptions {
        datetime: args.datetime,
        extensions: args.extensions.iter().filter(|e| !e.is_empty()).cloned().collect(),
        collection: args.collection.clone(),
        collection_url: args.collection_url.clone(),
        properties,
        private_properties,
        id: args.id.clone(),
        asset_name: args.asset_name.clone(),
        asset: AssetOptions {
            href: args.asset_href.clone(),
            ..asset.clone()
        },
        with_private,
        geom_densify_pts: args.densify_geom,
        geom_precision: args.geom_precision,
        ..Default::default()
    };

    let item = if args.recursive {
        if !args.input.is_dir() {
            bail!("Input must be a directory when using --recursive.");
        }

        let collect = CollectOptions {
            patterns: args.patterns.clone(),
            asset: AssetOptions {
                with_proj: true,
                ..asset
            },
            ..CollectOptions::for_directory(&args.input)
        };
        let assets = build_stac_assets(&collect);
        if assets.is_empty() {
            bail!("No valid files found in directory matching criteria.");
        }

        let source = directory_source(&args.input, &assets)
            .ok_or_else(|| anyhow!("No valid raster asset found to derive Item geometry."))?;
        log::info!("Deriving Item geometry from {}", source.display());

        if options.id.is_none() {
            options.id = args
                .input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        options.assets = Some(assets);

        create_stac_item(Source::from(source.as_path()), &options)?
    } else {
        match create_stac_item(Source::from(args.input.as_path()), &options) {
            Ok(item) => item,
            Err(StacError::SourceUnreadable(_)) if args.input.is_dir() => bail!(
                "Input '{}' is a directory. Did you mean to use `--recursive`?",
                args.input.display()
            ),
            Err(e) => return Err(e.into()),
        }
    };

    match &args.output {
        Some(output) => write_item(&item, output)
            .with_context(|| format!("Could not write {}", output.display()))?,
        None => println!("{}", serde_json::to_string(&item)?),
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
