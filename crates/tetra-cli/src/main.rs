//! tetrahedra_neighbours - neighbour and boundary extraction for GMF meshes
//!
//! Reads a tetrahedral volume mesh, links every tetrahedron to its face
//! neighbours in parallel, and writes the mesh back with its boundary and
//! material-interface triangles.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tetra_meshb::{read_mesh, with_default_extension, write_mesh};
use tetra_neighbours::{compute_neighbours, extract_surface, NeighbourSettings, MAX_WORKERS};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "tetrahedra_neighbours")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Build tetrahedra neighbours and extract boundary and interface triangles",
    long_about = None
)]
struct Cli {
    /// Input volume mesh, ".meshb" is appended when the name does not contain ".mesh"
    #[arg(long = "in", value_name = "NAME")]
    input: Option<String>,

    /// Output mesh, ".meshb" is appended when the name does not contain ".mesh"
    #[arg(long = "out", value_name = "NAME")]
    output: Option<String>,

    /// Number of worker threads, clamped to 1..=128 [default: every available core]
    #[arg(long, allow_negative_numbers = true)]
    nproc: Option<i64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Single-dash spellings accepted for compatibility with older scripts.
const LEGACY_FLAGS: [(&str, &str); 3] = [
    ("-in", "--in"),
    ("-out", "--out"),
    ("-nproc", "--nproc"),
];

/// Rewrite legacy single-dash flags to their long form.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| arg == *legacy)
                .map_or(arg, |(_, long)| OsString::from(long))
        })
        .collect()
}

fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Resolved input and output paths.
#[derive(Debug, PartialEq)]
struct Paths {
    input: PathBuf,
    output: PathBuf,
}

impl Cli {
    fn paths(&self) -> Result<Paths> {
        let input = self
            .input
            .as_deref()
            .map(with_default_extension)
            .context("no input mesh given, use --in <name>")?;
        let output = self
            .output
            .as_deref()
            .map(with_default_extension)
            .context("no output mesh given, use --out <name>")?;
        Ok(Paths { input, output })
    }

    /// Worker count handed to the pool, `0` when `--nproc` is absent.
    fn workers(&self) -> usize {
        self.nproc
            .map_or(0, |n| n.clamp(1, MAX_WORKERS as i64) as usize)
    }
}

fn run(paths: &Paths, settings: &NeighbourSettings) -> Result<()> {
    let start = Instant::now();
    let mut mesh = read_mesh(&paths.input)
        .with_context(|| format!("failed to read {}", paths.input.display()))?;
    info!(
        version = mesh.version,
        vertices = mesh.num_vertices(),
        tetrahedra = mesh.num_tetrahedra(),
        seconds = start.elapsed().as_secs_f64(),
        "read {}",
        paths.input.display()
    );
    if !mesh.triangles.is_empty() {
        warn!(count = mesh.num_triangles(), "discarding input triangles");
        mesh.triangles.clear();
    }

    let start = Instant::now();
    let neighbours = compute_neighbours(&mesh, settings)?;
    info!(
        workers = neighbours.workers,
        local_pairs = neighbours.local_pairs,
        cross_links = neighbours.cross_links,
        seconds = start.elapsed().as_secs_f64(),
        "built neighbours"
    );

    let start = Instant::now();
    let surface = extract_surface(&mesh, &neighbours.adjacency)?;
    info!(
        triangles = surface.triangles.len(),
        boundary = surface.boundary,
        interfaces = surface.interfaces,
        seconds = start.elapsed().as_secs_f64(),
        "extracted boundary"
    );
    mesh.append_triangles(surface.triangles);

    let start = Instant::now();
    write_mesh(&mesh, &paths.output)
        .with_context(|| format!("failed to write {}", paths.output.display()))?;
    info!(
        seconds = start.elapsed().as_secs_f64(),
        "wrote {}",
        paths.output.display()
    );
    Ok(())
}

/// Run the tool on a full argument list, program name first, and return
/// the process exit status.
fn execute(args: impl IntoIterator<Item = OsString>) -> u8 {
    let args = normalize_args(args);
    if args.len() <= 1 {
        // Usage goes to stdout, like --help.
        return if Cli::command().print_help().is_ok() { 0 } else { 1 };
    }

    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { 1 } else { 0 };
        }
    };

    // A subscriber installed earlier in the process keeps receiving events.
    if let Err(err) = init_logging(&cli.log_level) {
        eprintln!("logging not reconfigured: {err}");
    }

    let settings = NeighbourSettings::with_workers(cli.workers());
    match cli.paths().and_then(|paths| run(&paths, &settings)) {
        Ok(()) => 0,
        Err(err) => {
            error!("{err:#}");
            1
        }
    }
}

fn main() -> ExitCode {
    ExitCode::from(execute(std::env::args_os()))
}
