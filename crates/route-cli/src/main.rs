use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use route_cli::{render_json, render_text, Config, Navdata};
use route_core::{FinderConfig, RandomWalk, RouteAnalyzer, RouteRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Origin airport ICAO
    orig: String,

    /// Origin runway
    orig_runway: String,

    /// Destination airport ICAO
    dest: String,

    /// Destination runway
    dest_runway: String,

    /// Route description, e.g. DEPA P J1 T AUTO
    route: Vec<String>,

    /// Navdata snapshot (JSON). Falls back to ROUTE_NAVDATA.
    #[arg(long)]
    navdata: Option<PathBuf>,

    /// Seed for RAND segments. Falls back to ROUTE_RANDOM_SEED.
    #[arg(long)]
    seed: Option<u64>,

    /// Graph waypoints a runway without procedures links to
    #[arg(long)]
    terminal_links: Option<usize>,

    /// Graph waypoints each literal coordinate links to
    #[arg(long, default_value_t = 0)]
    coordinate_links: usize,

    /// Print the route as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("route_core=info".parse()?)
                .add_directive("route_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let env = Config::from_env();

    let navdata_path = args
        .navdata
        .or(env.navdata)
        .context("no navdata snapshot given (--navdata or ROUTE_NAVDATA)")?;
    let mut loaded = Navdata::load(&navdata_path)?.build()?;

    let mut config = FinderConfig {
        coordinate_link_count: args.coordinate_links,
        ..FinderConfig::default()
    };
    if let Some(links) = args.terminal_links.or(env.terminal_links) {
        config.terminal_link_count = links;
    }

    let random = match args.seed.or(env.random_seed) {
        Some(seed) => RandomWalk::seeded(seed),
        None => RandomWalk::new(),
    };
    let request = RouteRequest {
        orig_icao: args.orig.to_ascii_uppercase(),
        orig_runway: args.orig_runway.to_ascii_uppercase(),
        dest_icao: args.dest.to_ascii_uppercase(),
        dest_runway: args.dest_runway.to_ascii_uppercase(),
        route: args.route.join(" "),
    };

    let route = RouteAnalyzer::new(&loaded.airports, &loaded.procedures, &random)
        .with_config(config)
        .analyze(&mut loaded.graph, &request)
        .with_context(|| {
            format!(
                "resolving {}/{} -> {}/{}",
                request.orig_icao, request.orig_runway, request.dest_icao, request.dest_runway
            )
        })?;

    if args.json {
        println!("{}", render_json(&route)?);
    } else {
        print!("{}", render_text(&route));
    }
    Ok(())
}
