//! Rank a target library by ECFP6/FCFP6 Tanimoto similarity to query scaffolds.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use molprint_chem::DEFAULT_LIMIT;

#[derive(Parser)]
#[command(name = "tanimoto")]
#[command(version)]
#[command(about = "Score query scaffolds against a SMILES library", long_about = None)]
struct Cli {
    /// Target library, one `SMILES [name]` per line
    #[arg(short, long)]
    targets: PathBuf,

    /// Number of best scores to print
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Query scaffolds as SMILES, named Scaffold_1, Scaffold_2, ...
    #[arg(required = true)]
    queries: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    molprint_cli::init_tracing();
    molprint_cli::finish(molprint_cli::write_scores(
        &cli.queries,
        &cli.targets,
        cli.limit,
        &mut io::stdout().lock(),
    ))
}
