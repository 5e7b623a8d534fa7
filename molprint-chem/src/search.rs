//! ECFP6/FCFP6 Tanimoto scoring of query scaffolds against a target library.

use std::cmp::Ordering;

use molprint_core::{Annotated, MolprintError, Result, Summarizable};
use tracing::{debug, warn};

use crate::config::FingerprintConfig;
use crate::fingerprint::{tanimoto_similarity, Fingerprint};
use crate::output::FingerprintSet;
use crate::profile::{fingerprint_smiles, Profile};

/// Number of scores kept by default.
pub const DEFAULT_LIMIT: usize = 100;

/// A named molecule with its ECFP6 and FCFP6 fingerprints.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmallMolecule {
    pub name: String,
    pub smiles: String,
    pub ecfp6: Fingerprint,
    pub fcfp6: Fingerprint,
}

impl SmallMolecule {
    pub fn from_smiles(name: impl Into<String>, smiles: &str) -> Result<Self> {
        Self::with_config(name, smiles, &FingerprintConfig::default())
    }

    pub fn with_config(name: impl Into<String>, smiles: &str, config: &FingerprintConfig) -> Result<Self> {
        let set = fingerprint_smiles(smiles, Profile::Ecfp6Fcfp6, config)?;
        Ok(SmallMolecule {
            name: name.into(),
            smiles: smiles.to_string(),
            ecfp6: take(&set, "ecfp6")?,
            fcfp6: take(&set, "fcfp6")?,
        })
    }
}

fn take(set: &FingerprintSet, label: &str) -> Result<Fingerprint> {
    set.get(label)
        .cloned()
        .ok_or_else(|| MolprintError::Fingerprint(format!("missing {label} fingerprint")))
}

impl Annotated for SmallMolecule {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Similarity of one query against one target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TanimotoScore {
    pub query: String,
    pub target: String,
    pub ecfp6: f64,
    pub fcfp6: f64,
}

impl TanimotoScore {
    /// Higher ECFP6 first, then higher FCFP6.
    fn rank(&self, other: &Self) -> Ordering {
        other.ecfp6.total_cmp(&self.ecfp6).then(other.fcfp6.total_cmp(&self.fcfp6))
    }
}

impl Summarizable for TanimotoScore {
    fn summary(&self) -> String {
        format!("{}\t{}\t{:.4}\t{:.4}", self.query, self.target, self.ecfp6, self.fcfp6)
    }
}

pub fn score(query: &SmallMolecule, target: &SmallMolecule) -> TanimotoScore {
    TanimotoScore {
        query: query.name.clone(),
        target: target.name.clone(),
        ecfp6: tanimoto_similarity(&query.ecfp6, &target.ecfp6),
        fcfp6: tanimoto_similarity(&query.fcfp6, &target.fcfp6),
    }
}

/// Fingerprint `(name, smiles)` entries, dropping the ones that fail to parse.
pub fn fingerprint_entries(entries: &[(String, String)]) -> Vec<SmallMolecule> {
    let build = |(name, smiles): &(String, String)| match SmallMolecule::from_smiles(name.as_str(), smiles) {
        Ok(mol) => Some(mol),
        Err(e) => {
            warn!(name = name.as_str(), smiles = smiles.as_str(), error = %e, "skipping molecule");
            None
        }
    };

    #[cfg(feature = "parallel")]
    let molecules: Vec<SmallMolecule> = {
        use rayon::prelude::*;
        entries.par_iter().filter_map(build).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let molecules: Vec<SmallMolecule> = entries.iter().filter_map(build).collect();

    debug!(requested = entries.len(), fingerprinted = molecules.len(), "fingerprinted library");
    molecules
}

/// Fingerprint query SMILES, naming them `Scaffold_1..N` by input position.
pub fn fingerprint_library(smiles: &[String]) -> Vec<SmallMolecule> {
    let entries: Vec<(String, String)> = smiles
        .iter()
        .enumerate()
        .map(|(i, smi)| (format!("Scaffold_{}", i + 1), smi.clone()))
        .collect();
    fingerprint_entries(&entries)
}

/// Read a target library: one `SMILES [name]` per line, `#` comments and
/// blank lines ignored. Unnamed entries become `Target_<line>`.
pub fn parse_library(text: &str) -> Vec<(String, String)> {
    text.lines()
        .enumerate()
        .filter_map(|(lineno, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (smiles, name) = match line.split_once(char::is_whitespace) {
                Some((smiles, name)) => (smiles, name.trim().to_string()),
                None => (line, format!("Target_{}", lineno + 1)),
            };
            Some((name, smiles.to_string()))
        })
        .collect()
}

/// Score every query against every target and keep the best `limit`.
pub fn score_library(queries: &[SmallMolecule], targets: &[SmallMolecule], limit: usize) -> Vec<TanimotoScore> {
    #[cfg(feature = "parallel")]
    let mut scores: Vec<TanimotoScore> = {
        use rayon::prelude::*;
        queries
            .par_iter()
            .flat_map_iter(|q| targets.iter().map(move |t| score(q, t)))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let mut scores: Vec<TanimotoScore> = queries
        .iter()
        .flat_map(|q| targets.iter().map(move |t| score(q, t)))
        .collect();

    scores.sort_by(TanimotoScore::rank);
    scores.truncate(limit);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(name: &str, smiles: &str) -> SmallMolecule {
        SmallMolecule::from_smiles(name, smiles).unwrap()
    }

    #[test]
    fn from_smiles_matches_profile() {
        let m = mol("aspirin", "CC(=O)Oc1ccccc1C(=O)O");
        let set = fingerprint_smiles(&m.smiles, Profile::Ecfp6Fcfp6, &FingerprintConfig::default()).unwrap();
        assert_eq!(set.get("ecfp6"), Some(&m.ecfp6));
        assert_eq!(set.get("fcfp6"), Some(&m.fcfp6));
        assert_eq!(m.name(), "aspirin");
        assert!(SmallMolecule::from_smiles("bad", "notasmiles").is_err());
    }

    #[test]
    fn self_score_is_one() {
        let m = mol("q", "c1ccccc1O");
        let s = score(&m, &m);
        assert_eq!(s.ecfp6, 1.0);
        assert_eq!(s.fcfp6, 1.0);
        assert_eq!(s.summary(), "q\tq\t1.0000\t1.0000");
    }

    #[test]
    fn library_names_follow_input_position() {
        let smiles = vec!["CCO".to_string(), "notasmiles".to_string(), "c1ccccc1".to_string()];
        let lib = fingerprint_library(&smiles);
        let names: Vec<&str> = lib.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Scaffold_1", "Scaffold_3"]);
    }

    #[test]
    fn parses_library_text() {
        let text = "# targets\nCCO ethanol\n\nc1ccccc1\nCC(=O)O  acetic acid\n";
        let entries = parse_library(text);
        assert_eq!(
            entries,
            vec![
                ("ethanol".to_string(), "CCO".to_string()),
                ("Target_4".to_string(), "c1ccccc1".to_string()),
                ("acetic acid".to_string(), "CC(=O)O".to_string()),
            ]
        );
    }

    #[test]
    fn keeps_exactly_limit_best_scores() {
        let queries = fingerprint_library(&["c1ccccc1O".to_string(), "CCN".to_string()]);
        let targets = fingerprint_entries(&[
            ("phenol".to_string(), "c1ccccc1O".to_string()),
            ("ethylamine".to_string(), "CCN".to_string()),
            ("toluene".to_string(), "c1ccccc1C".to_string()),
        ]);

        let all = score_library(&queries, &targets, DEFAULT_LIMIT);
        assert_eq!(all.len(), 6);
        for pair in all.windows(2) {
            assert!(pair[0].ecfp6 >= pair[1].ecfp6);
        }

        let top = score_library(&queries, &targets, 2);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|s| s.ecfp6 == 1.0));
        assert!(score_library(&queries, &targets, 0).is_empty());
    }

    #[test]
    fn fcfp6_breaks_ties() {
        let a = TanimotoScore { query: "q".into(), target: "a".into(), ecfp6: 0.5, fcfp6: 0.2 };
        let b = TanimotoScore { query: "q".into(), target: "b".into(), ecfp6: 0.5, fcfp6: 0.9 };
        assert_eq!(a.rank(&b), Ordering::Greater);
        assert_eq!(b.rank(&a), Ordering::Less);
    }
}
