use clap::{Args, Parser, Subcommand};
use emu_core::config::parse_buffer_meters;
use std::path::PathBuf;

/// EMU - Ecological Marine Unit water-column explorer
#[derive(Parser, Debug)]
#[command(name = "emu")]
#[command(about = "Query Ecological Marine Unit water columns, profiles and statistics", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serve queries from a JSON fixture instead of the feature service
    #[arg(long, global = true, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Feature service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub service_url: Option<String>,

    /// Geocode service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub geocode_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find the water column nearest to a point
    Locate(LocateArgs),

    /// Show the depth profile at a mesh point
    Profile(ProfileArgs),

    /// Load summary statistics and show global extrema or one cluster
    Stats(StatsArgs),

    /// Resolve slider values to depth layers
    Depth(DepthArgs),

    /// Geocode an address and find the nearest water column
    Search(SearchArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

/// A longitude/latitude pair given as flags
#[derive(Args, Debug, Clone, Copy)]
pub struct PointArgs {
    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
}

#[derive(Parser, Debug)]
pub struct LocateArgs {
    #[command(flatten)]
    pub point: PointArgs,

    /// Search radius around the point, in meters
    #[arg(long, value_name = "METERS", value_parser = parse_buffer)]
    pub buffer_meters: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub point: PointArgs,

    /// Only show one property (e.g. temperature, salinity, nitrate)
    #[arg(long)]
    pub property: Option<String>,
}

#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Show statistics of one cluster
    #[arg(long, value_name = "ID")]
    pub cluster: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct DepthArgs {
    /// Slider values in 0..=100; repeated values are served from the cache
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub values: Vec<i32>,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Free-text address or place name
    #[arg(required = true, num_args = 1..)]
    pub address: Vec<String>,
}

fn parse_buffer(s: &str) -> Result<f64, String> {
    parse_buffer_meters(s).map_err(|e| e.to_string())
}
