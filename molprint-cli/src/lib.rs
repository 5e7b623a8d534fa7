//! Shared plumbing for the molprint binaries.
//!
//! - `fingerprints <SMILES>`: the full thirteen-fingerprint profile
//! - `ecfp6-fcfp6 <SMILES>`: FCFP6 then ECFP6
//! - `tanimoto --targets <FILE> <SMILES>...`: ranked ECFP6/FCFP6 similarity
//!
//! Results go to stdout, diagnostics to stderr. Exit status is 1 on any
//! parse or I/O failure, in which case stdout stays empty.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use molprint_chem::{
    fingerprint_entries, fingerprint_library, fingerprint_smiles, parse_library, score_library, FingerprintConfig,
    Profile,
};
use molprint_core::{MolprintError, Result, Summarizable};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Compute `profile` for `smiles` and write it to `out`.
///
/// Nothing is written unless every fingerprint succeeds.
pub fn write_profile<W: Write>(smiles: &str, profile: Profile, out: &mut W) -> Result<()> {
    let set = fingerprint_smiles(smiles, profile, &FingerprintConfig::default())?;
    debug!(profile = ?profile, count = set.len(), "writing fingerprints");
    set.write_to(out)
}

/// Score `queries` against the library in `targets` and write the top
/// `limit` as tab-separated lines.
pub fn write_scores<W: Write>(queries: &[String], targets: &Path, limit: usize, out: &mut W) -> Result<()> {
    let text = std::fs::read_to_string(targets)?;
    let library = fingerprint_entries(&parse_library(&text));
    if library.is_empty() {
        return Err(MolprintError::InvalidInput(format!(
            "no usable targets in {}",
            targets.display()
        )));
    }
    let queries = fingerprint_library(queries);
    if queries.is_empty() {
        return Err(MolprintError::InvalidInput("no usable query SMILES".into()));
    }

    let scores = score_library(&queries, &library, limit);
    let mut buf = Vec::new();
    for score in &scores {
        writeln!(buf, "{}", score.summary())?;
    }
    out.write_all(&buf)?;
    out.flush()?;
    Ok(())
}

/// Map a command result to the process exit status.
pub fn finish(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_output_has_one_line_per_label() {
        let mut out = Vec::new();
        write_profile("CCO", Profile::Full, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let labels: Vec<&str> = text.lines().filter_map(|l| l.split(' ').next()).collect();
        assert_eq!(labels, Profile::Full.labels());
    }

    #[test]
    fn failed_profile_writes_nothing() {
        let mut out = Vec::new();
        assert!(write_profile("notasmiles", Profile::Full, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn missing_target_file_is_io_error() {
        let mut out = Vec::new();
        let err = write_scores(&["CCO".to_string()], Path::new("/nonexistent/targets.smi"), 10, &mut out).unwrap_err();
        assert!(matches!(err, MolprintError::Io(_)));
        assert!(out.is_empty());
    }
}
