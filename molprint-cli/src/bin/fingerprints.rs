//! Print the full fingerprint profile of one SMILES string.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use molprint_chem::Profile;

#[derive(Parser)]
#[command(name = "fingerprints")]
#[command(version)]
#[command(about = "Print ECFP, FCFP, MACCS, atom-pair, torsion and path fingerprints of a molecule", long_about = None)]
struct Cli {
    /// Molecule as a SMILES string
    smiles: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    molprint_cli::init_tracing();
    molprint_cli::finish(molprint_cli::write_profile(&cli.smiles, Profile::Full, &mut io::stdout().lock()))
}
