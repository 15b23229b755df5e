use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use valhalla_graphtile::tile_provider::DirectoryTileProvider;
use valinor_router::RouteContext;
use valinor_sif::{BicycleType, RiderProfile};

/// Queries a bidirectional bicycle route between two points over a
/// directory of Valhalla-format tiles.
#[derive(Parser, Debug)]
#[command(name = "valinor-cli", author, version, about, long_about = None)]
struct Cli {
    /// Root directory containing the `<level>/<AAA>/<BBB>/<CCC>.gph[.gz]` tile tree
    #[arg(env)]
    tiles_root: PathBuf,

    /// Origin latitude, in degrees
    #[arg(long, env)]
    origin_lat: f64,
    /// Origin longitude, in degrees
    #[arg(long, env)]
    origin_lon: f64,
    /// Destination latitude, in degrees
    #[arg(long, env)]
    dest_lat: f64,
    /// Destination longitude, in degrees
    #[arg(long, env)]
    dest_lon: f64,

    /// Bicycle type: 0 = road, 1 = cross, 2 = hybrid, 3 = mountain
    #[arg(long, env, default_value_t = 3)]
    bicycle_type: u8,
    /// Road preference, in [0, 1]
    #[arg(long, env, default_value_t = 0.25)]
    use_roads: f64,
    /// Hill-avoidance strength, in [0, 1]
    #[arg(long, env, default_value_t = 0.25)]
    use_hills: f64,
    /// Strongly avoid pedestrian-only edges (pushing the bike)
    #[arg(long, env, default_value_t = false)]
    avoid_pushing: bool,
    /// Apply a stress penalty to car-accessible edges
    #[arg(long, env, default_value_t = false)]
    avoid_cars: bool,
}

/// The CLI's JSON result framing, wrapping a `valinor-router` route
/// outcome for output on stdout.
#[derive(Serialize)]
struct RouteReport {
    path: Vec<(f64, f64)>,
    dist_car_free_km: f64,
    dist_separated_km: f64,
    dist_with_cars_km: f64,
    dist_pushing_km: f64,
    iterations: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_filter(EnvFilter::from_default_env()))
        .init();

    let cli = Cli::parse();

    let bicycle_type = BicycleType::try_from(cli.bicycle_type)
        .map_err(|e| anyhow!("invalid bicycle type {}: {e}", cli.bicycle_type))?;
    let profile = RiderProfile {
        bicycle_type,
        use_roads: cli.use_roads,
        use_hills: cli.use_hills,
        avoid_pushing: cli.avoid_pushing,
        avoid_cars: cli.avoid_cars,
    };

    let provider = DirectoryTileProvider::new(&cli.tiles_root);
    let ctx = RouteContext::new(&provider, profile);

    match ctx.route((cli.origin_lat, cli.origin_lon), (cli.dest_lat, cli.dest_lon)) {
        Ok(outcome) => {
            let report = RouteReport {
                path: outcome.path,
                dist_car_free_km: outcome.statistics.dist_car_free_km,
                dist_separated_km: outcome.statistics.dist_separated_km,
                dist_with_cars_km: outcome.statistics.dist_with_cars_km,
                dist_pushing_km: outcome.statistics.dist_pushing_km,
                iterations: outcome.iterations,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
