//! navpath CLI - inspect navigation meshes and run path queries.
//!
//! - `navpath info <mesh.json>` - graph statistics
//! - `navpath path <mesh.json> --from x,y,z --to x,y,z` - one query, printed as JSON
//! - `navpath batch <mesh.json> <queries.json>` - many queries through the request queue

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

use navpath::{
    MeshBuffers, PathFindingOptions, PathRequestQueue, PathResponse, Pathfinder,
    PathfinderConfig, QueueConfig, Vec3,
};

#[derive(Parser)]
#[command(name = "navpath")]
#[command(about = "Navigation-mesh pathfinding", version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print graph statistics for a mesh
    Info {
        /// Mesh buffers as JSON
        mesh: PathBuf,
    },

    /// Find a single path
    Path {
        /// Mesh buffers as JSON
        mesh: PathBuf,

        /// Start point as x,y,z
        #[arg(long, value_parser = parse_point)]
        from: Vec3,

        /// End point as x,y,z
        #[arg(long, value_parser = parse_point)]
        to: Vec3,

        /// Return edge midpoints instead of the string-pulled path
        #[arg(long)]
        raw: bool,

        /// Locate endpoints by casting down onto the surface
        #[arg(long)]
        raycast: bool,
    },

    /// Run a list of queries through the background request queue
    Batch {
        /// Mesh buffers as JSON
        mesh: PathBuf,

        /// JSON array of queries
        queries: PathBuf,

        /// Give up waiting for completions after this many seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

/// Contents of the `--config` file. Missing sections fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CliConfig {
    pathfinder: PathfinderConfig,
    queue: QueueConfig,
}

impl CliConfig {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
struct Query {
    id: u64,
    from: [f32; 3],
    to: [f32; 3],
    #[serde(default = "default_query_options")]
    options: PathFindingOptions,
}

fn default_query_options() -> PathFindingOptions {
    PathFindingOptions::simplified()
}

#[derive(Debug, Serialize)]
struct PathOutput {
    id: u64,
    found: bool,
    points: Vec<[f32; 3]>,
}

impl From<PathResponse> for PathOutput {
    fn from(response: PathResponse) -> Self {
        Self {
            id: response.id,
            found: response.found,
            points: response.path.into_iter().map(Vec3::to_array).collect(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    match cli.command {
        Commands::Info { mesh } => show_info(&mesh, &config),
        Commands::Path {
            mesh,
            from,
            to,
            raw,
            raycast,
        } => {
            let options = if raw {
                PathFindingOptions::raw()
            } else {
                PathFindingOptions::simplified()
            }
            .with_xyz_axis(raycast);
            find_one(&mesh, &config, from, to, options)
        }
        Commands::Batch {
            mesh,
            queries,
            timeout_secs,
        } => run_batch(
            &mesh,
            &queries,
            &config,
            Duration::from_secs(timeout_secs),
        ),
    }
}

fn parse_point(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got '{s}'"));
    };
    let coord = |v: &str| {
        v.parse::<f32>()
            .map_err(|e| format!("invalid coordinate '{v}': {e}"))
    };
    Ok(Vec3::new(coord(x)?, coord(y)?, coord(z)?))
}

fn load_mesh(path: &Path) -> Result<MeshBuffers> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mesh from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse mesh from {}", path.display()))
}

fn load_pathfinder(path: &Path, config: &CliConfig) -> Result<Pathfinder> {
    let mesh = load_mesh(path)?;
    let pathfinder = Pathfinder::with_config(&mesh, config.pathfinder)
        .with_context(|| format!("Invalid mesh in {}", path.display()))?;
    tracing::info!(
        mesh = %path.display(),
        triangles = pathfinder.graph().triangle_count(),
        edges = pathfinder.graph().edge_count(),
        "Mesh loaded"
    );
    Ok(pathfinder)
}

fn show_info(mesh: &Path, config: &CliConfig) -> Result<()> {
    let input = load_mesh(mesh)?;
    let pathfinder = Pathfinder::with_config(&input, config.pathfinder)
        .with_context(|| format!("Invalid mesh in {}", mesh.display()))?;
    let graph = pathfinder.graph();
    let (min, max) = graph.bounds();

    println!("Mesh: {}", mesh.display());
    println!();
    println!(
        "Vertices:   {} ({} before merging)",
        graph.vertex_count(),
        input.vertices.len()
    );
    println!(
        "Triangles:  {} ({} before dropping degenerates)",
        graph.triangle_count(),
        input.triangle_count()
    );
    println!("Nav edges:  {}", graph.edge_count());
    println!(
        "Bounds:     [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
        min.x, min.y, min.z, max.x, max.y, max.z
    );

    let isolated = graph
        .triangles()
        .iter()
        .filter(|t| t.nav_edge_count() == 0)
        .count();
    if isolated > 0 {
        println!("Isolated:   {isolated} triangle(s) with no navigable neighbour");
    }

    Ok(())
}

fn find_one(
    mesh: &Path,
    config: &CliConfig,
    from: Vec3,
    to: Vec3,
    options: PathFindingOptions,
) -> Result<()> {
    let pathfinder = load_pathfinder(mesh, config)?;
    let mut points = Vec::new();
    let found = pathfinder.find_path(from, to, &mut points, None, options);
    if !found {
        tracing::warn!(?from, ?to, "No path found");
    }

    let output = PathOutput {
        id: 0,
        found,
        points: points.into_iter().map(Vec3::to_array).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_batch(mesh: &Path, queries: &Path, config: &CliConfig, timeout: Duration) -> Result<()> {
    let pathfinder = Arc::new(load_pathfinder(mesh, config)?);
    let content = std::fs::read_to_string(queries)
        .with_context(|| format!("Failed to read queries from {}", queries.display()))?;
    let queries: Vec<Query> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse queries from {}", queries.display()))?;

    let mut queue = PathRequestQueue::with_config(pathfinder, config.queue.clone())
        .context("Failed to start path worker")?;
    let (tx, rx) = mpsc::channel();

    let total = queries.len();
    for query in queries {
        let tx = tx.clone();
        queue.submit(
            query.id,
            query.from.into(),
            query.to.into(),
            Vec::new(),
            query.options,
            move |response| {
                // The receiver outlives every pump below.
                let _ = tx.send(PathOutput::from(response));
            },
        );
    }
    tracing::info!(total, "Queries submitted");

    let deadline = Instant::now() + timeout;
    let mut results = Vec::with_capacity(total);
    while results.len() < total {
        if queue.pump_completions() == 0 {
            if Instant::now() >= deadline {
                bail!(
                    "Timed out after {}s with {} of {} queries complete",
                    timeout.as_secs(),
                    results.len(),
                    total
                );
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        results.extend(rx.try_iter());
    }
    queue.shutdown();

    let found = results.iter().filter(|r| r.found).count();
    tracing::info!(total, found, "Batch complete");
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
