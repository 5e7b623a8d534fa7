//! Fingerprint profiles: which fingerprints to compute and under which labels.

use molprint_core::{MolprintError, Result};
use tracing::debug;

use crate::atom_pair::atom_pair_fingerprint;
use crate::config::FingerprintConfig;
use crate::features::feature_invariants;
use crate::fingerprint::Fingerprint;
use crate::maccs::maccs_with_rings;
use crate::molecule::Molecule;
use crate::morgan::{connectivity_invariants, morgan_from_invariants};
use crate::output::FingerprintSet;
use crate::path::path_fingerprint;
use crate::ring::RingInfo;
use crate::smiles::parse_smiles;
use crate::torsion::torsion_fingerprint;

/// A fingerprint algorithm with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FingerprintKind {
    /// Circular fingerprint; `features` selects pharmacophore invariants.
    Morgan { radius: usize, features: bool },
    Maccs,
    AtomPair,
    Torsion,
    /// Branched subgraphs of up to `max_path` bonds.
    Path { max_path: usize },
}

/// A labelled fingerprint request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintSpec {
    pub label: &'static str,
    pub kind: FingerprintKind,
}

impl FingerprintSpec {
    pub const fn new(label: &'static str, kind: FingerprintKind) -> Self {
        FingerprintSpec { label, kind }
    }
}

const fn ecfp(label: &'static str, radius: usize) -> FingerprintSpec {
    FingerprintSpec::new(label, FingerprintKind::Morgan { radius, features: false })
}

const fn fcfp(label: &'static str, radius: usize) -> FingerprintSpec {
    FingerprintSpec::new(label, FingerprintKind::Morgan { radius, features: true })
}

const FULL: [FingerprintSpec; 13] = [
    ecfp("ecfp0", 0),
    ecfp("ecfp2", 1),
    ecfp("ecfp4", 2),
    ecfp("ecfp6", 3),
    fcfp("fcfp2", 1),
    fcfp("fcfp4", 2),
    fcfp("fcfp6", 3),
    FingerprintSpec::new("maccs", FingerprintKind::Maccs),
    FingerprintSpec::new("ap", FingerprintKind::AtomPair),
    FingerprintSpec::new("tt", FingerprintKind::Torsion),
    FingerprintSpec::new("rdk5", FingerprintKind::Path { max_path: 5 }),
    FingerprintSpec::new("rdk6", FingerprintKind::Path { max_path: 6 }),
    FingerprintSpec::new("rdk7", FingerprintKind::Path { max_path: 7 }),
];

const ECFP6_FCFP6: [FingerprintSpec; 2] = [fcfp("fcfp6", 3), ecfp("ecfp6", 3)];

/// A fixed, ordered list of fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Profile {
    /// Thirteen fingerprints: ECFP0-6, FCFP2-6, MACCS, atom pairs,
    /// torsions and paths of length 5-7.
    Full,
    /// FCFP6 followed by ECFP6.
    Ecfp6Fcfp6,
}

impl Profile {
    pub fn specs(self) -> &'static [FingerprintSpec] {
        match self {
            Profile::Full => &FULL,
            Profile::Ecfp6Fcfp6 => &ECFP6_FCFP6,
        }
    }

    /// Labels in output order.
    pub fn labels(self) -> Vec<&'static str> {
        self.specs().iter().map(|s| s.label).collect()
    }
}

/// Lazily computed per-molecule state shared between fingerprints.
struct Perception<'a> {
    mol: &'a Molecule,
    rings: RingInfo,
    connectivity: Option<Vec<u64>>,
    features: Option<Vec<u64>>,
}

impl<'a> Perception<'a> {
    fn new(mol: &'a Molecule) -> Self {
        Perception { mol, rings: RingInfo::new(mol), connectivity: None, features: None }
    }

    fn invariants(&mut self, features: bool) -> &[u64] {
        let (mol, rings) = (self.mol, &self.rings);
        if features {
            self.features.get_or_insert_with(|| {
                feature_invariants(mol, rings).into_iter().map(u64::from).collect()
            })
        } else {
            self.connectivity.get_or_insert_with(|| connectivity_invariants(mol, rings))
        }
    }

    fn compute(&mut self, kind: FingerprintKind, config: &FingerprintConfig) -> Fingerprint {
        match kind {
            FingerprintKind::Morgan { radius, features } => {
                let mol = self.mol;
                morgan_from_invariants(mol, self.invariants(features), radius, config.nbits)
            }
            FingerprintKind::Maccs => maccs_with_rings(self.mol, &self.rings),
            FingerprintKind::AtomPair => atom_pair_fingerprint(self.mol, config),
            FingerprintKind::Torsion => torsion_fingerprint(self.mol, config),
            FingerprintKind::Path { max_path } => path_fingerprint(self.mol, max_path, config),
        }
    }
}

/// Compute every fingerprint in `specs` for `mol`, in order.
pub fn compute_fingerprints(
    mol: &Molecule,
    specs: &[FingerprintSpec],
    config: &FingerprintConfig,
) -> Result<FingerprintSet> {
    config.validate()?;
    if mol.atom_count() == 0 {
        return Err(MolprintError::Fingerprint("cannot fingerprint a molecule with no atoms".into()));
    }
    for spec in specs {
        if let FingerprintKind::Path { max_path } = spec.kind {
            if max_path < config.min_path {
                return Err(MolprintError::Fingerprint(format!(
                    "{}: max path {max_path} is below min path {}",
                    spec.label, config.min_path
                )));
            }
        }
    }

    let mut perception = Perception::new(mol);
    let mut set = FingerprintSet::new();
    for spec in specs {
        let fp = perception.compute(spec.kind, config);
        debug!(label = spec.label, on_bits = fp.count_ones(), "computed fingerprint");
        set.push(spec.label, fp)?;
    }
    Ok(set)
}

/// Parse `smiles` and compute the fingerprints of `profile`.
pub fn fingerprint_smiles(smiles: &str, profile: Profile, config: &FingerprintConfig) -> Result<FingerprintSet> {
    let mol = parse_smiles(smiles)?;
    debug!(smiles, atoms = mol.atom_count(), bonds = mol.bond_count(), "parsed molecule");
    compute_fingerprints(&mol, profile.specs(), config)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn chain_smiles() -> impl Strategy<Value = String> {
        let atoms = prop_oneof![Just("C"), Just("N"), Just("O"), Just("C(=O)"), Just("c1ccccc1")];
        proptest::collection::vec(atoms, 1..=8).prop_map(|parts| parts.join(""))
    }

    proptest! {
        #[test]
        fn fingerprints_are_deterministic(smi in chain_smiles()) {
            let config = FingerprintConfig::default();
            if let Ok(first) = fingerprint_smiles(&smi, Profile::Full, &config) {
                let second = fingerprint_smiles(&smi, Profile::Full, &config).unwrap();
                prop_assert_eq!(first, second);
            }
        }
    }
}
