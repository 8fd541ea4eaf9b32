use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use bmpc_compiler::{
    Artifacts, CdnBackend, GenericBackend, compile,
    config::{BenchConfig, MpcKind},
    generate,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Generic secret-sharing backend with oblivious selection.
    Oip,
    /// Specialized backend with a native disjunction primitive.
    Cdn,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Branching-MPC circuit compiler", long_about = None)]
struct Args {
    /// Benchmark parameters as LOG2LENGTH-BRANCHES-PARTIES, e.g. `16-4-3`
    #[arg(conflicts_with = "config")]
    params: Option<String>,

    /// JSON benchmark configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emission backend
    #[arg(long, value_enum, default_value_t = BackendArg::Oip)]
    backend: BackendArg,

    /// Circuit artifact path (stdout when omitted)
    #[arg(long)]
    circuit: Option<PathBuf>,

    /// Runner artifact path (stdout when omitted)
    #[arg(long)]
    runner: Option<PathBuf>,

    /// Prime of the working field
    #[arg(long, default_value_t = 65537)]
    prime: u64,

    /// Seed for reproducible branch generation
    #[arg(long, default_value_t = 0x3333)]
    seed: u64,
}

fn parse_params(params: &str) -> Result<(usize, usize, usize)> {
    let parts: Vec<&str> = params.split('-').collect();
    let [log_length, branches, parties] = parts.as_slice() else {
        bail!("expected LOG2LENGTH-BRANCHES-PARTIES, got `{params}`");
    };
    Ok((
        log_length.parse().context("invalid circuit length")?,
        branches.parse().context("invalid branch count")?,
        parties.parse().context("invalid party count")?,
    ))
}

fn export(path: Option<&PathBuf>, text: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = ChaCha20Rng::seed_from_u64(args.seed);

    let (program, parties, backend) = if let Some(path) = &args.config {
        let cfg = BenchConfig::from_path(path)?;
        let p = cfg.circuit.parameters;
        let program = generate::layered_program(&mut rng, p.branches, p.per_layer, p.length)?;
        let backend = match cfg.mpc.kind {
            MpcKind::Oip => BackendArg::Oip,
            MpcKind::Cdn => BackendArg::Cdn,
        };
        (program, cfg.mpc.parties, backend)
    } else if let Some(params) = &args.params {
        let (log_length, branches, parties) = parse_params(params)?;
        let program = generate::benchmark_program(&mut rng, branches, log_length)?;
        (program, parties, args.backend)
    } else {
        bail!("either PARAMS or --config is required");
    };

    let Artifacts { circuit, runner } = match backend {
        BackendArg::Oip => compile(GenericBackend::new(), parties, args.prime, &program)?,
        BackendArg::Cdn => compile(CdnBackend::new(), parties, args.prime, &program)?,
    };

    export(args.circuit.as_ref(), &circuit)?;
    export(args.runner.as_ref(), &runner)?;
    Ok(())
}
