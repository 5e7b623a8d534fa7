#![no_main]
use libfuzzer_sys::fuzz_target;
use molprint_chem::{compute_fingerprints, parse_smiles, FingerprintConfig, Profile};

fuzz_target!(|data: &str| {
    if let Ok(mol) = parse_smiles(data) {
        if mol.atom_count() <= 64 {
            let _ = compute_fingerprints(&mol, Profile::Full.specs(), &FingerprintConfig::default());
        }
    }
});
