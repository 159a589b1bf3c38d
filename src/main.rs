use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use routeplay::{Coordinate, PlaybackController, RouteIndex, DEFAULT_OPTIONS};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct RouteLoadError(PathBuf, #[source] routeplay::route::Error);

#[derive(Debug, thiserror::Error)]
#[error("route can't be played back: it has less than 2 coordinates or zero length")]
struct CannotSimulate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One JSON playback snapshot per line
    Json,

    /// Simulated vehicle track as a GeoJSON FeatureCollection
    Geojson,
}

#[derive(Parser)]
struct Cli {
    /// The path to the Directions API response (JSON, optionally gzip or bzip2 compressed)
    route_file: PathBuf,

    /// Playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Simulated frames per second
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Which route alternative to play back
    #[arg(long, default_value_t = 0)]
    alternative: usize,

    /// Snap the vehicle bearing instead of turning smoothly
    #[arg(long)]
    no_smooth: bool,

    /// Output every n-th frame (the final frame is always printed)
    #[arg(long, default_value_t = 30)]
    every: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let index = Arc::new(load_route(&cli.route_file, cli.alternative)?);
    log::info!(
        "loaded route: {} coordinates, {:.0} m, {:.0} s",
        index.path().len(),
        index.total_distance(),
        index.total_duration(),
    );

    let mut options = DEFAULT_OPTIONS;
    options.smooth_turns = !cli.no_smooth;

    let mut controller = PlaybackController::new((), options);
    controller.set_follow_camera(false);
    controller.load_route(index);
    controller.set_speed(cli.speed);

    if !controller.play() {
        return Err(CannotSimulate.into());
    }

    let frame_ms = 1000.0 / cli.fps.max(1.0);
    let every = cli.every.max(1);
    let mut now = 0.0;
    let mut frame = 0_usize;
    let mut track: Vec<Coordinate> = Vec::default();

    loop {
        let more = controller.tick(now);
        let snapshot = controller.snapshot();

        match cli.format {
            OutputFormat::Json => {
                if !more || frame % every == 0 {
                    println!("{}", serde_json::to_string(snapshot)?);
                }
            }
            OutputFormat::Geojson => {
                if track
                    .last()
                    .is_none_or(|last| !last.same_position(snapshot.position))
                {
                    track.push(snapshot.position);
                }
            }
        }

        if !more {
            break;
        }
        now += frame_ms;
        frame += 1;
    }

    log::info!("playback finished after {} frames ({:.1} s)", frame + 1, now / 1000.0);

    if cli.format == OutputFormat::Geojson {
        let geojson = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "LineString",
                    "coordinates": track,
                },
            }],
        });
        println!("{}", serde_json::to_string_pretty(&geojson)?);
    }

    Ok(())
}

fn load_route<P: AsRef<Path>>(path: P, alternative: usize) -> Result<RouteIndex, RouteLoadError> {
    let options = routeplay::route::ReadOptions {
        file_format: routeplay::route::FileFormat::Unknown,
        alternative,
    };
    match routeplay::route::read_route_from_file(path.as_ref(), &options) {
        Ok(route) => Ok(RouteIndex::build(&route)),
        Err(e) => Err(RouteLoadError(PathBuf::from(path.as_ref()), e)),
    }
}
