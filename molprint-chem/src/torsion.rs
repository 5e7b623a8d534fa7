//! Hashed topological torsion fingerprints.

use std::collections::HashMap;

use crate::atom_pair::{atom_code, CODE_SIZE};
use crate::config::FingerprintConfig;
use crate::fingerprint::{fnv1a_hash, fold_hash, Fingerprint};
use crate::molecule::Molecule;

/// Every linear four-atom path `a-b-c-d`, each listed once.
fn torsion_paths(mol: &Molecule) -> Vec<[usize; 4]> {
    let mut paths = Vec::new();
    for bond in &mol.bonds {
        let (b, c) = (bond.atom1, bond.atom2);
        for &(a, _) in &mol.adjacency[b] {
            if a == c {
                continue;
            }
            for &(d, _) in &mol.adjacency[c] {
                if d != b && d != a {
                    paths.push([a, b, c, d]);
                }
            }
        }
    }
    paths
}

/// Torsion code read in the direction with the smaller code sequence.
fn torsion_code(mol: &Molecule, path: &[usize; 4]) -> u64 {
    let codes: [u64; 4] = [
        atom_code(mol, path[0], 1),
        atom_code(mol, path[1], 2),
        atom_code(mol, path[2], 2),
        atom_code(mol, path[3], 1),
    ];
    let mut reversed = codes;
    reversed.reverse();
    let canonical = codes.min(reversed);
    canonical
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &c)| acc | c << (i as u32 * CODE_SIZE))
}

/// Compute a hashed topological torsion fingerprint.
pub fn torsion_fingerprint(mol: &Molecule, config: &FingerprintConfig) -> Fingerprint {
    let mut fp = Fingerprint::new(config.nbits);
    let buckets = config.buckets();

    let mut counts: HashMap<usize, usize> = HashMap::new();
    for path in torsion_paths(mol) {
        let code = torsion_code(mol, &path);
        *counts.entry(fold_hash(fnv1a_hash([code]), buckets)).or_default() += 1;
    }

    for (bucket, count) in counts {
        fp.set_count_bits(bucket, count, config.bits_per_entry);
    }
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn butane_has_one_torsion() {
        let mol = parse_smiles("CCCC").unwrap();
        assert_eq!(torsion_paths(&mol).len(), 1);
        let fp = torsion_fingerprint(&mol, &FingerprintConfig::default());
        assert_eq!(fp.count_ones(), 1);
    }

    #[test]
    fn short_chains_have_none() {
        let mol = parse_smiles("CCC").unwrap();
        assert!(torsion_paths(&mol).is_empty());
        assert_eq!(torsion_fingerprint(&mol, &FingerprintConfig::default()).count_ones(), 0);
    }

    #[test]
    fn three_rings_are_not_torsions() {
        let mol = parse_smiles("C1CC1").unwrap();
        assert!(torsion_paths(&mol).is_empty());
    }

    #[test]
    fn benzene_torsions_share_a_bucket() {
        // six equivalent paths around the ring
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(torsion_paths(&mol).len(), 6);
        let fp = torsion_fingerprint(&mol, &FingerprintConfig::default());
        assert_eq!(fp.count_ones(), 4);
    }

    #[test]
    fn direction_does_not_matter() {
        let forward = parse_smiles("NCCO").unwrap();
        let backward = parse_smiles("OCCN").unwrap();
        let config = FingerprintConfig::default();
        assert_eq!(torsion_fingerprint(&forward, &config), torsion_fingerprint(&backward, &config));
    }
}
