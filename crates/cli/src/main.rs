use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use geotile::compute::footprint::{Footprint, build_footprint, diff};
use geotile::compute::geojson::{parse_features, to_geo};
use geotile::{Access, Config, GeoStore, NewDomain, NewItem, SpatialQuery, TileKey};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Owner of the scratch domain the `query` command loads features into.
const LOCAL_USER: &str = "local";
const LOCAL_DOMAIN: &str = "local";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON (or TOML, with the `toml` feature) configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tiles each feature of a GeoJSON file covers
    Cover {
        #[arg(short, long, default_value_t = 12)]
        zoom: u8,

        file: PathBuf,
    },

    /// Load a GeoJSON file into an in-memory domain and run a spatial query
    Query {
        #[arg(short, long, default_value_t = 12)]
        zoom: u8,

        /// minX,minY,maxX,maxY
        #[arg(long, conflicts_with = "point", required_unless_present = "point")]
        bbox: Option<String>,

        /// x,y
        #[arg(long)]
        point: Option<String>,

        file: PathBuf,
    },

    /// Print the index changes between the first features of two GeoJSON files
    Diff {
        #[arg(short, long, default_value_t = 12)]
        zoom: u8,

        old: PathBuf,
        new: PathBuf,
    },
}

#[derive(Serialize)]
struct FeatureCover {
    feature: usize,
    tiles: Vec<TileKey>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiffReport {
    to_add: Vec<TileKey>,
    to_remove: Vec<TileKey>,
    size_delta: i64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geotile=info,geotile_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Cover { zoom, file } => cover(&config, zoom, &file),
        Command::Query {
            zoom,
            bbox,
            point,
            file,
        } => query(config, zoom, bbox.as_deref(), point.as_deref(), &file),
        Command::Diff { zoom, old, new } => print_diff(&config, zoom, &old, &new),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(path, &text).with_context(|| format!("Invalid config {}", path.display()))
}

#[cfg(feature = "toml")]
fn parse_config(path: &Path, text: &str) -> anyhow::Result<Config> {
    if path.extension().is_some_and(|ext| ext == "toml") {
        return Ok(Config::from_toml(text)?);
    }
    Ok(Config::from_json(text)?)
}

#[cfg(not(feature = "toml"))]
fn parse_config(_path: &Path, text: &str) -> anyhow::Result<Config> {
    Ok(Config::from_json(text)?)
}

fn read_features(path: &Path) -> anyhow::Result<Vec<geojson::Feature>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let features = parse_features(&text)?;
    debug!("Read {} features from {}", features.len(), path.display());
    Ok(features)
}

fn feature_footprint(config: &Config, zoom: u8, feature: &geojson::Feature) -> anyhow::Result<Footprint> {
    let Some(geometry) = &feature.geometry else {
        bail!("Feature has no geometry");
    };
    Ok(build_footprint(
        &to_geo(geometry)?,
        zoom,
        config.max_item_index_size,
    )?)
}

fn cover(config: &Config, zoom: u8, file: &Path) -> anyhow::Result<()> {
    for (index, feature) in read_features(file)?.iter().enumerate() {
        let footprint = feature_footprint(config, zoom, feature)
            .with_context(|| format!("Feature {}", index))?;
        let line = FeatureCover {
            feature: index,
            tiles: footprint.into_iter().collect(),
        };
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

fn query(
    config: Config,
    zoom: u8,
    bbox: Option<&str>,
    point: Option<&str>,
    file: &Path,
) -> anyhow::Result<()> {
    let spatial = SpatialQuery::from_params(bbox, point)?;

    let db = GeoStore::builder().config(config).build()?;
    db.create_domain(
        LOCAL_USER,
        LOCAL_DOMAIN,
        NewDomain::new(file.display().to_string(), zoom).with_access(Access::Public),
    )?;

    let features = read_features(file)?;
    for (index, feature) in features.into_iter().enumerate() {
        db.create_item(LOCAL_USER, LOCAL_DOMAIN, NewItem::from(feature))
            .with_context(|| format!("Feature {}", index))?;
    }

    let domain = db.get_domain(None, LOCAL_DOMAIN)?;
    info!(
        "Indexed {} features into {} tiles at zoom {}",
        domain.item_count, domain.index_size, domain.zoom
    );

    let result = db.query_items(None, LOCAL_DOMAIN, &spatial)?;
    info!("{} features matched", result.len());
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn first_footprint(config: &Config, zoom: u8, file: &Path) -> anyhow::Result<Footprint> {
    let features = read_features(file)?;
    let Some(feature) = features.first() else {
        bail!("{} contains no features", file.display());
    };
    feature_footprint(config, zoom, feature).with_context(|| format!("{}", file.display()))
}

fn print_diff(config: &Config, zoom: u8, old: &Path, new: &Path) -> anyhow::Result<()> {
    let old = first_footprint(config, zoom, old)?;
    let new = first_footprint(config, zoom, new)?;
    let changes = diff(&old, &new);

    let report = DiffReport {
        size_delta: changes.size_delta(),
        to_add: changes.to_add,
        to_remove: changes.to_remove,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const POINTS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"origin"},"geometry":{"type":"Point","coordinates":[0,0]}},
        {"type":"Feature","properties":{"name":"far"},"geometry":{"type":"Point","coordinates":[20,20]}}
    ]}"#;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["geotile", "query", "--bbox", "-1,-1,1,1", "in.geojson"])
            .unwrap();
        match args.command {
            Command::Query { zoom, bbox, .. } => {
                assert_eq!(zoom, 12);
                assert_eq!(bbox.as_deref(), Some("-1,-1,1,1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Args::try_parse_from(["geotile", "query", "in.geojson"]).is_err());
    }

    #[test]
    fn test_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"max_item_index_size": 7}"#).unwrap();

        assert_eq!(load_config(Some(&path)).unwrap().max_item_index_size, 7);
        assert_eq!(load_config(None).unwrap(), Config::default());
        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_feature_footprints() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("points.geojson");
        fs::write(&path, POINTS).unwrap();

        let features = read_features(&path).unwrap();
        assert_eq!(features.len(), 2);
        let footprint = feature_footprint(&Config::default(), 8, &features[0]).unwrap();
        assert!(footprint.contains(49152));

        let old = first_footprint(&Config::default(), 8, &path).unwrap();
        assert!(diff(&old, &footprint).is_empty());
    }
}
