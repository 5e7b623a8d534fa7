//! SMILES parsing and 2D molecular fingerprints.
//!
//! Provides a molecular graph with ring and aromaticity perception, a SMARTS
//! matcher, and circular (ECFP/FCFP), MACCS, atom-pair, topological-torsion
//! and branched-path fingerprints, grouped into labelled profiles.
//!
//! # Example
//!
//! ```
//! use molprint_chem::{fingerprint_smiles, tanimoto_similarity, FingerprintConfig, Profile};
//!
//! let config = FingerprintConfig::default();
//! let aspirin = fingerprint_smiles("CC(=O)Oc1ccccc1C(=O)O", Profile::Full, &config).unwrap();
//! assert_eq!(aspirin.len(), 13);
//! assert_eq!(aspirin.get("maccs").unwrap().nbits(), 167);
//!
//! let salicylic = fingerprint_smiles("OC(=O)c1ccccc1O", Profile::Ecfp6Fcfp6, &config).unwrap();
//! let sim = tanimoto_similarity(aspirin.get("ecfp6").unwrap(), salicylic.get("ecfp6").unwrap());
//! assert!(sim > 0.0 && sim < 1.0);
//! ```

pub mod aromaticity;
pub mod atom_pair;
pub mod config;
pub mod element;
pub mod features;
pub mod fingerprint;
pub mod maccs;
pub mod molecule;
pub mod morgan;
pub mod output;
pub mod path;
pub mod profile;
pub mod ring;
pub mod search;
pub mod smarts;
pub mod smiles;
pub mod torsion;

pub use aromaticity::{find_aromatic_rings, set_aromaticity};
pub use atom_pair::atom_pair_fingerprint;
pub use config::FingerprintConfig;
pub use element::{element_by_number, element_by_symbol, Element};
pub use features::Feature;
pub use fingerprint::{tanimoto_bulk, tanimoto_similarity, Fingerprint};
pub use maccs::{maccs_fingerprint, MACCS_BITS};
pub use molecule::{Bond, BondOrder, MolAtom, Molecule};
pub use morgan::{feature_morgan_fingerprint, morgan_fingerprint};
pub use output::FingerprintSet;
pub use path::path_fingerprint;
pub use profile::{compute_fingerprints, fingerprint_smiles, FingerprintKind, FingerprintSpec, Profile};
pub use ring::RingInfo;
pub use search::{
    fingerprint_entries, fingerprint_library, parse_library, score, score_library, SmallMolecule, TanimotoScore,
    DEFAULT_LIMIT,
};
pub use smarts::{parse_smarts, smarts_match, SmartsMatcher, SmartsPattern};
pub use smiles::{parse_smiles, parse_smiles_named};
pub use torsion::torsion_fingerprint;
