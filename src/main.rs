//! `pangreps` CLI: the wrapping tool spec.md §6 describes as "illustrative"
//! and SPEC_FULL §11 pins down as three subcommands mirroring the teacher's
//! `main.rs` `Commands` enum dispatch (`gffx index|intersect|extract|search`
//! becomes `pangreps index|seeds|verify`).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use clap::{Parser, Subcommand};

use pangreps::stats::LiveStats;
use pangreps::{load_graph, load_reads, FinderConfig, PangrepsError, SeedFinder};

#[derive(Parser)]
#[command(
    name = "pangreps",
    version,
    about = concat!("pangreps: a fully-sensitive hybrid seed finder for pan-genome sequence graphs\nVersion: ", env!("CARGO_PKG_VERSION")),
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a path index, starting-loci set, and distance index for a graph.
    Index(IndexArgs),
    /// Seed a FASTQ/FASTA read file against a graph's hybrid index.
    Seeds(SeedsArgs),
    /// Ad hoc distance-index query: is there a walk of length in [dmin,dmax]
    /// between two graph positions?
    Verify(VerifyArgs),
}

#[derive(Parser, Debug, Clone)]
struct CommonArgs {
    /// Input graph, in GFA format (S/L/P lines).
    #[arg(short, long)]
    graph: PathBuf,

    /// Seed length.
    #[arg(short = 'k', long)]
    k: usize,

    /// Number of reference paths selected per weakly-connected region.
    #[arg(short = 'n', long = "n-paths", default_value_t = 1)]
    n_paths: usize,

    /// Extend uncovered-but-common positions with a short context to
    /// reduce starting-locus density.
    #[arg(long, default_value_t = false)]
    patched: bool,

    /// Context length used when `patched` is set; `0` defaults to `k`.
    #[arg(long, default_value_t = 0)]
    context: usize,

    /// Starting-loci sub-sampling stride.
    #[arg(long, default_value_t = 1)]
    step: usize,

    /// Minimum walk length verified by the distance index.
    #[arg(long, default_value_t = 0)]
    dmin: u32,

    /// Maximum walk length verified by the distance index; `0` defaults to `dmin`.
    #[arg(long, default_value_t = 0)]
    dmax: u32,

    /// Shared save/load prefix for the path index, starting loci, and
    /// distance matrix siblings (spec.md §6).
    #[arg(short = 'x', long = "index-prefix")]
    index_prefix: PathBuf,

    /// Number of rayon worker threads; `0` uses rayon's default.
    #[arg(short = 't', long, default_value_t = 0)]
    threads: usize,

    /// Enable verbose (info-level) logging.
    #[arg(short = 'v', long, default_value_t = false)]
    verbose: bool,
}

impl CommonArgs {
    fn base_config(&self) -> FinderConfig {
        FinderConfig {
            k: self.k,
            gocc_threshold: 0,
            mismatches: 0,
            n_paths: self.n_paths,
            patched: self.patched,
            context: self.context,
            step: self.step,
            dmin: self.dmin,
            dmax: self.dmax,
            distance: 0,
            chunk_size: 256,
        }
    }

    fn init_rayon(&self) -> CliResult<()> {
        if self.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build_global()
                .map_err(|e| CliError::Argument(format!("failed to configure thread pool: {e}")))?;
        }
        Ok(())
    }

    fn init_logging(&self) {
        let level = if self.verbose { "info" } else { "warn" };
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();
    }
}

#[derive(Parser, Debug)]
struct IndexArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct SeedsArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// FASTQ or FASTA read file.
    #[arg(short, long)]
    reads: PathBuf,

    /// Output path for binary seed-hit records; stdout if omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seeds are read-index chunked `chunk_size` reads at a time.
    #[arg(long, default_value_t = 256)]
    chunk_size: usize,

    /// gocc threshold above which a k-mer is pruned; `0` means unlimited.
    #[arg(long, default_value_t = 0)]
    gocc_threshold: usize,

    /// Stride between consecutive extracted seeds within one read; `0` uses `k`.
    #[arg(long, default_value_t = 0)]
    distance: usize,

    /// Rebuild the path index even if a cached one is found under `index-prefix`.
    #[arg(long, default_value_t = false)]
    rebuild: bool,

    /// Report progress/timer snapshots to stdout on SIGUSR1.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

#[derive(Parser, Debug)]
struct VerifyArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Source node id.
    #[arg(long)]
    v: u64,
    /// Source offset within the source node.
    #[arg(long)]
    o: u32,
    /// Target node id.
    #[arg(long)]
    u: u64,
    /// Target offset within the target node.
    #[arg(long)]
    p: u32,
}

enum CliError {
    Argument(String),
    Io(String),
}

type CliResult<T> = std::result::Result<T, CliError>;

impl From<PangrepsError> for CliError {
    fn from(e: PangrepsError) -> Self {
        match e {
            PangrepsError::InvalidArgument(_) => CliError::Argument(e.to_string()),
            PangrepsError::Io { .. } | PangrepsError::IndexCorruption { .. } | PangrepsError::CapacityExceeded(_) => {
                CliError::Io(e.to_string())
            }
            PangrepsError::NotImplemented(_) => CliError::Argument(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Argument(msg)) => {
            eprintln!("pangreps: argument error: {msg}");
            ExitCode::from(1)
        }
        Err(CliError::Io(msg)) => {
            eprintln!("pangreps: I/O error: {msg}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Index(args) => run_index(&args),
        Commands::Seeds(args) => run_seeds(&args),
        Commands::Verify(args) => run_verify(&args),
    }
}

fn run_index(args: &IndexArgs) -> CliResult<()> {
    args.common.init_logging();
    args.common.init_rayon()?;

    let graph = load_graph(&args.common.graph)?;
    let mut finder = SeedFinder::new(args.common.base_config())?;
    finder.create_path_index(&graph)?;
    finder.serialize_path_index(&args.common.index_prefix)?;

    if args.common.verbose {
        log::info!("wrote path index, starting loci, and distance matrix under {}", args.common.index_prefix.display());
    }
    Ok(())
}

fn run_seeds(args: &SeedsArgs) -> CliResult<()> {
    args.common.init_logging();
    args.common.init_rayon()?;

    let graph = load_graph(&args.common.graph)?;

    let mut config = args.common.base_config();
    config.chunk_size = args.chunk_size;
    config.gocc_threshold = args.gocc_threshold;
    config.distance = args.distance;
    let mut finder = SeedFinder::new(config)?;

    if args.stats || args.common.verbose {
        let stats: Arc<LiveStats> = LiveStats::new();
        if args.stats {
            stats.install_signal_handler(signal_hook::consts::SIGUSR1)?;
        }
        finder = finder.with_stats(stats);
    }

    if args.rebuild {
        finder.create_path_index(&graph)?;
        finder.serialize_path_index(&args.common.index_prefix)?;
    } else {
        // idempotent: a missing sibling file is rebuilt and saved before
        // this returns (spec.md §7).
        finder.load_path_index(&graph, &args.common.index_prefix)?;
    }

    let reads = load_reads(&args.reads)?;

    let out: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    let out = std::sync::Mutex::new(out);

    finder.seeds_all(&graph, &reads, |hit| {
        let mut out = out.lock().unwrap();
        let _ = write_hit_record(&mut *out, hit.node_id, hit.node_offset as u32, hit.read_id, hit.read_offset);
    })?;
    out.into_inner().unwrap().flush()?;

    Ok(())
}

fn run_verify(args: &VerifyArgs) -> CliResult<()> {
    args.common.init_logging();

    let graph = load_graph(&args.common.graph)?;
    let mut finder = SeedFinder::new(args.common.base_config())?;
    finder.load_path_index(&graph, &args.common.index_prefix)?;

    let distance_index = finder
        .distance_index()
        .ok_or_else(|| PangrepsError::InvalidArgument("no distance index available".into()))?;

    let reachable = distance_index.verify(&graph, args.v, args.o, args.u, args.p);
    println!("{reachable}");
    Ok(())
}

/// `{node_id, node_offset, read_id, read_offset}` binary record per
/// spec.md §6's output stream contract.
fn write_hit_record<W: Write>(w: &mut W, node_id: u64, node_offset: u32, read_id: u32, read_offset: u32) -> std::io::Result<()> {
    w.write_u64::<LittleEndian>(node_id)?;
    w.write_u32::<LittleEndian>(node_offset)?;
    w.write_u32::<LittleEndian>(read_id)?;
    w.write_u32::<LittleEndian>(read_offset)
}
