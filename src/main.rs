use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use class2c::ir::MethodSig;
use class2c::{generate, CompileMode, Options, PruneLevel, TargetPlatform};

/// CLI arguments for a class2c run.
#[derive(Parser, Debug)]
#[command(
    name = "class2c",
    about = "Translates a JVM-style class model into self-contained C sources.",
    version
)]
struct Cli {
    /// Program model, as JSON.
    model: PathBuf,
    /// Entry class; its main([Ljava/lang/String;)V drives reachability.
    root_class: String,
    /// Where generated files land.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = ModeArg::Full)]
    mode: ModeArg,
    /// 0 keeps every class, 1 prunes to the reachable closure.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    prune: u8,
    #[arg(long, value_enum, default_value_t = TargetArg::Unix)]
    target: TargetArg,
    /// Runtime support sources, recorded in the makefile.
    #[arg(long, value_name = "DIR", default_value = "runtime")]
    runtime_dir: PathBuf,
    /// Directory probed for hand-written method and class bodies.
    #[arg(long, value_name = "DIR")]
    overrides_dir: Option<PathBuf>,
    /// Call-graph cache file, primed on the first run.
    #[arg(long, value_name = "PATH")]
    cache: Option<PathBuf>,
    /// Extra pruning root, written class.name(descriptor); repeatable.
    #[arg(long = "extra-root", value_name = "SIG", value_parser = parse_root)]
    extra_roots: Vec<MethodSig>,
    /// More -v, more detail (info, debug, trace); RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Full,
    SingleClass,
}

impl From<ModeArg> for CompileMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Full => CompileMode::Full,
            ModeArg::SingleClass => CompileMode::SingleClass,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TargetArg {
    Unix,
    C6x,
}

impl From<TargetArg> for TargetPlatform {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Unix => TargetPlatform::Unix,
            TargetArg::C6x => TargetPlatform::C6x,
        }
    }
}

fn parse_root(raw: &str) -> Result<MethodSig, String> {
    let paren = raw
        .find('(')
        .ok_or_else(|| format!("'{raw}' has no descriptor; expected class.name(descriptor)"))?;
    let (front, descriptor) = raw.split_at(paren);
    let dot = front
        .rfind('.')
        .ok_or_else(|| format!("'{raw}' has no class; expected class.name(descriptor)"))?;
    Ok(MethodSig::new(&front[..dot], &front[dot + 1..], descriptor))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let started_at = Instant::now();
    let program = class2c::load_program(&cli.model)
        .with_context(|| format!("cannot load model {}", cli.model.display()))?;

    let options = Options {
        mode: cli.mode.into(),
        prune_level: if cli.prune == 0 {
            PruneLevel::None
        } else {
            PruneLevel::CallGraph
        },
        target: cli.target.into(),
        output_dir: cli.output.clone(),
        runtime_dir: cli.runtime_dir.clone(),
        overrides_dir: cli.overrides_dir.clone(),
        cache_path: cli.cache.clone(),
        extra_roots: cli.extra_roots.clone(),
    };

    let summary = generate(&program, &cli.root_class, &options)
        .with_context(|| format!("generation from {} failed", cli.root_class))?;

    println!(
        "{} classes, {} methods, {} fields reachable; {} files written to {} in {:.2?}",
        summary.classes,
        summary.methods,
        summary.fields,
        summary.files_written,
        cli.output.display(),
        started_at.elapsed()
    );
    if summary.files_failed > 0 {
        anyhow::bail!("{} files could not be written", summary.files_failed);
    }
    Ok(())
}
