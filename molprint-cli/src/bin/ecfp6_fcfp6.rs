//! Print the FCFP6 and ECFP6 fingerprints of one SMILES string.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use molprint_chem::Profile;

#[derive(Parser)]
#[command(name = "ecfp6-fcfp6")]
#[command(version)]
#[command(about = "Print FCFP6 and ECFP6 fingerprints of a molecule", long_about = None)]
struct Cli {
    /// Molecule as a SMILES string
    smiles: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    molprint_cli::init_tracing();
    molprint_cli::finish(molprint_cli::write_profile(&cli.smiles, Profile::Ecfp6Fcfp6, &mut io::stdout().lock()))
}
