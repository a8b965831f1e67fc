//! gps-trace command line interface
//!
//! Loads GPX files, projects them into local planar coordinates, and prints
//! per-file summaries or every projected point.

use clap::Parser;
use gps_trace::{GeoSample, Trace};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Load GPX tracks and project them into local planar coordinates
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// GPX files to load
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Fixed reference point as "LAT,LON" in decimal degrees, shared by all
    /// traces; defaults to each file's first track point
    #[arg(long, value_parser = parse_origin)]
    origin: Option<GeoSample>,

    /// Print every projected point as "x - y" in meters
    #[arg(long)]
    points: bool,
}

fn parse_origin(value: &str) -> Result<GeoSample, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {value:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude: {e}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude: {e}"))?;
    if !lat.is_finite() || !lon.is_finite() {
        return Err("coordinates must be finite".to_string());
    }
    Ok(GeoSample::new(lat, lon))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut failures = 0usize;
    for file in &args.files {
        let mut trace = match args.origin {
            Some(origin) => Trace::with_origin(origin),
            None => Trace::new(),
        };

        match trace.load(file) {
            Ok(count) => {
                tracing::info!(
                    file = %file.display(),
                    points = count,
                    meters = trace.total_distance(),
                    "Loaded track"
                );
                if args.points {
                    for point in trace.points() {
                        println!("{} - {}", point.x(), point.y());
                    }
                }
            }
            Err(e) => {
                failures += 1;
                tracing::error!(file = %file.display(), error = %e, "Failed to load track");
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origin() {
        let origin = parse_origin("45.0,7.5").unwrap();
        assert_eq!(origin, GeoSample::new(45.0, 7.5));

        let spaced = parse_origin(" 45.0 , -7.5 ").unwrap();
        assert_eq!(spaced, GeoSample::new(45.0, -7.5));
    }

    #[test]
    fn test_parse_origin_rejects_garbage() {
        assert!(parse_origin("45.0").is_err());
        assert!(parse_origin("a,b").is_err());
        assert!(parse_origin("NaN,0.0").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
