//! abc-bullet CLI - export scene descriptions and inspect written archives.

use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::Command as Process;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use abc_bullet::archive::{ArchiveDocument, OArchive, PropertyValue};
use abc_bullet::export::{ExportJob, JobArgs, ScriptDialect, ScriptEvaluator, STATISTICS_PROPERTY};
use abc_bullet::scene::MemoryScene;
use abc_bullet::util::DagPath;

#[derive(Parser, Debug)]
#[command(name = "abc-bullet", version, about = "Rigid-body scene exporter")]
struct Cli {
    /// Show debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a JSON scene description to an archive.
    Export(ExportArgs),
    /// Show archive info and object counts.
    Info { archive: PathBuf },
    /// Show the full object hierarchy of an archive.
    Tree { archive: PathBuf },
    /// Print version and build date.
    Version,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Input scene description JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Job arguments JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output archive path.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Root node to export (repeatable).
    #[arg(long = "root")]
    roots: Vec<String>,

    /// Frame range start and end.
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    frame_range: Option<Vec<f64>>,

    /// Frames between samples.
    #[arg(long)]
    step: Option<f64>,

    /// Sample offsets relative to each step (repeatable).
    #[arg(long = "frame-relative-sample", allow_negative_numbers = true)]
    relative_samples: Vec<f64>,

    /// Frames per second.
    #[arg(long)]
    fps: Option<f64>,

    /// Export only the selection and its ancestors.
    #[arg(long = "sl")]
    selection: bool,

    /// Skip nodes that are not renderable.
    #[arg(long)]
    exclude_invisible: bool,

    /// Namespace qualifiers to strip from output names.
    #[arg(long)]
    strip_namespace: Option<u32>,

    /// User attribute to export (repeatable).
    #[arg(long = "attr")]
    attributes: Vec<String>,

    /// User attribute prefix to export (repeatable).
    #[arg(long = "attr-prefix")]
    attr_prefixes: Vec<String>,

    #[arg(long)]
    mel_per_frame_callback: Option<String>,
    #[arg(long)]
    python_per_frame_callback: Option<String>,
    #[arg(long)]
    mel_post_callback: Option<String>,
    #[arg(long)]
    python_post_callback: Option<String>,

    /// Log every solved leaf sample.
    #[arg(long)]
    verbose_samples: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Info { archive } => cmd_info(&archive),
        Command::Tree { archive } => cmd_tree(&archive),
        Command::Version => {
            println!(
                "abc-bullet {} (built {})",
                env!("CARGO_PKG_VERSION"),
                env!("ABC_BULLET_BUILD_DATE")
            );
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Runs Python callbacks through the system interpreter.
///
/// MEL needs a running host; those commands are only logged.
struct ProcessEvaluator;

impl ScriptEvaluator for ProcessEvaluator {
    fn execute(&mut self, dialect: ScriptDialect, command: &str) {
        match dialect {
            ScriptDialect::Mel => tracing::info!("mel callback (not evaluated): {}", command),
            ScriptDialect::Python => match Process::new("python3").arg("-c").arg(command).status() {
                Ok(status) if status.success() => {}
                Ok(status) => tracing::warn!("python callback exited with {}: {}", status, command),
                Err(e) => tracing::warn!("python callback failed to start: {}", e),
            },
        }
    }
}

fn job_args(args: &ExportArgs) -> anyhow::Result<JobArgs> {
    let mut job = match &args.config {
        Some(path) => JobArgs::load(path).with_context(|| format!("read config '{}'", path.display()))?,
        None => JobArgs::default(),
    };

    if let Some(file) = &args.file {
        job.file = file.clone();
    }
    if !args.roots.is_empty() {
        job.dag_paths = args.roots.iter().map(|r| DagPath::parse(r)).collect();
    }
    if let Some(range) = &args.frame_range {
        job.frame_range.start = range[0];
        job.frame_range.end = range[1];
    }
    if let Some(step) = args.step {
        job.frame_range.step = step;
    }
    if !args.relative_samples.is_empty() {
        job.frame_range.relative_samples = args.relative_samples.clone();
    }
    if let Some(fps) = args.fps {
        job.fps = fps;
    }
    if let Some(depth) = args.strip_namespace {
        job.strip_namespace = depth;
    }
    job.use_selection_list |= args.selection;
    job.exclude_invisible |= args.exclude_invisible;
    job.verbose |= args.verbose_samples;
    job.attributes.extend(args.attributes.iter().cloned());
    job.attr_prefixes.extend(args.attr_prefixes.iter().cloned());

    let callbacks = [
        (&args.mel_per_frame_callback, &mut job.mel_per_frame_callback),
        (&args.python_per_frame_callback, &mut job.python_per_frame_callback),
        (&args.mel_post_callback, &mut job.mel_post_callback),
        (&args.python_post_callback, &mut job.python_post_callback),
    ];
    for (flag, slot) in callbacks {
        if let Some(template) = flag {
            *slot = template.clone();
        }
    }
    Ok(job)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut scene = MemoryScene::load(&args.scene)
        .with_context(|| format!("load scene '{}'", args.scene.display()))?;
    let job_args = job_args(&args)?;

    let mut job: ExportJob<OArchive> = ExportJob::from_args(job_args)?;
    let frames: Vec<f64> = job.frames().iter().collect();
    let mut evaluator = ProcessEvaluator;

    tracing::info!("exporting {} frames to {}", frames.len(), job.file().display());
    for frame in frames {
        scene.set_frame(frame);
        if job.eval(frame, &scene, &mut evaluator)? {
            break;
        }
    }

    if let Some(stats) = job.statistics() {
        eprintln!("wrote {} ({})", job.file().display(), stats.summary().trim_end());
    }
    Ok(())
}

fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let doc = ArchiveDocument::open(path).with_context(|| format!("open archive '{}'", path.display()))?;
    let mut out = io::stdout().lock();
    writeln!(out, "Archive: {}", path.display())?;
    writeln!(out, "Metadata: {}", doc.meta_data.serialize())?;
    writeln!(out, "Time samplings: {}", doc.time_samplings.len())?;
    for (i, ts) in doc.time_samplings.iter().enumerate() {
        match ts.time_range() {
            Some((first, last)) => {
                writeln!(out, "  {}: {} samples, {}s .. {}s", i, ts.max_samples, first, last)?
            }
            None => writeln!(out, "  {}: {} samples", i, ts.max_samples)?,
        }
    }
    if let Some(PropertyValue::String(stats)) = doc
        .root
        .property(STATISTICS_PROPERTY)
        .and_then(|p| p.samples.first())
    {
        writeln!(out, "Statistics: {}", stats.trim_end())?;
    }
    writeln!(out, "Total objects: {}", doc.num_objects())?;
    Ok(())
}

fn cmd_tree(path: &Path) -> anyhow::Result<()> {
    let doc = ArchiveDocument::open(path).with_context(|| format!("open archive '{}'", path.display()))?;
    let mut out = io::stdout().lock();
    doc.print_tree(&mut out)?;
    Ok(())
}
