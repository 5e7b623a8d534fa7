//! Morgan (circular, ECFP/FCFP-style) fingerprints.
//!
//! Each atom starts from an invariant and is re-hashed once per radius step
//! with its bonded neighbours. Every distinct environment, identified by the
//! set of bonds it covers, contributes one bit.

use std::collections::HashSet;

use crate::features::feature_invariants;
use crate::fingerprint::{fnv1a_hash, fold_hash, Fingerprint};
use crate::molecule::Molecule;
use crate::ring::RingInfo;

/// Connectivity (ECFP) invariants: atomic number, degree, total hydrogens,
/// formal charge, isotope and ring membership.
pub fn connectivity_invariants(mol: &Molecule, rings: &RingInfo) -> Vec<u64> {
    mol.atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| {
            fnv1a_hash([
                atom.atomic_number as u64,
                mol.degree(i) as u64,
                mol.total_hydrogens(i) as u64,
                atom.formal_charge as i64 as u64,
                atom.isotope.unwrap_or(0) as u64,
                rings.atom_in_ring[i] as u64,
            ])
        })
        .collect()
}

/// Compute an ECFP-style fingerprint. `radius` 2 gives ECFP4, 3 gives ECFP6.
pub fn morgan_fingerprint(mol: &Molecule, radius: usize, nbits: usize) -> Fingerprint {
    let rings = RingInfo::new(mol);
    morgan_from_invariants(mol, &connectivity_invariants(mol, &rings), radius, nbits)
}

/// Compute an FCFP-style fingerprint seeded with pharmacophore feature masks.
pub fn feature_morgan_fingerprint(mol: &Molecule, radius: usize, nbits: usize) -> Fingerprint {
    let rings = RingInfo::new(mol);
    let invariants: Vec<u64> = feature_invariants(mol, &rings).into_iter().map(u64::from).collect();
    morgan_from_invariants(mol, &invariants, radius, nbits)
}

/// Morgan iteration over caller-supplied initial invariants.
pub fn morgan_from_invariants(mol: &Molecule, invariants: &[u64], radius: usize, nbits: usize) -> Fingerprint {
    let n = mol.atom_count();
    let mut fp = Fingerprint::new(nbits);
    if n == 0 {
        return fp;
    }

    let mut identifiers = invariants.to_vec();
    for &id in &identifiers {
        fp.set_bit(fold_hash(id, nbits));
    }

    // Bond sets already emitted, across all layers.
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut neighborhoods: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut dead = vec![false; n];

    for layer in 0..radius {
        let mut next_identifiers = identifiers.clone();
        let mut next_neighborhoods = neighborhoods.clone();
        let mut candidates: Vec<(Vec<usize>, u64, usize)> = Vec::with_capacity(n);

        for i in 0..n {
            if dead[i] {
                continue;
            }
            let mut env: Vec<(u64, u64)> = Vec::with_capacity(mol.degree(i));
            let mut bonds = neighborhoods[i].clone();
            for &(neighbor, bond_idx) in &mol.adjacency[i] {
                env.push((mol.bonds[bond_idx].order.type_code(), identifiers[neighbor]));
                bonds.push(bond_idx);
                bonds.extend_from_slice(&neighborhoods[neighbor]);
            }
            env.sort_unstable();
            bonds.sort_unstable();
            bonds.dedup();

            let id = fnv1a_hash(
                [layer as u64, identifiers[i]]
                    .into_iter()
                    .chain(env.into_iter().flat_map(|(b, nid)| [b, nid])),
            );
            next_identifiers[i] = id;
            candidates.push((bonds.clone(), id, i));
            next_neighborhoods[i] = bonds;
        }

        // Equal environments resolve to the smallest identifier.
        candidates.sort_unstable();
        for (bonds, id, atom) in candidates {
            if seen.contains(&bonds) {
                dead[atom] = true;
            } else {
                fp.set_bit(fold_hash(id, nbits));
                seen.insert(bonds);
            }
        }

        identifiers = next_identifiers;
        neighborhoods = next_neighborhoods;
    }

    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::tanimoto_similarity;
    use crate::smiles::parse_smiles;

    #[test]
    fn deterministic_fingerprint() {
        let mol = parse_smiles("CCO").unwrap();
        let fp1 = morgan_fingerprint(&mol, 2, 1024);
        let fp2 = morgan_fingerprint(&mol, 2, 1024);
        assert_eq!(fp1, fp2);
        assert_eq!(fp1.nbits(), 1024);
    }

    #[test]
    fn radius_zero_counts_atom_types() {
        // ethanol: three distinct atom environments
        let mol = parse_smiles("CCO").unwrap();
        assert!(morgan_fingerprint(&mol, 0, 1024).count_ones() <= 3);
        // benzene: all six atoms share one invariant
        let benzene = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(morgan_fingerprint(&benzene, 0, 1024).count_ones(), 1);
    }

    #[test]
    fn larger_radius_is_superset() {
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let fp2 = morgan_fingerprint(&mol, 1, 1024);
        let fp6 = morgan_fingerprint(&mol, 3, 1024);
        for bit in fp2.on_bits() {
            assert!(fp6.get_bit(bit));
        }
        assert!(fp6.count_ones() > fp2.count_ones());
    }

    #[test]
    fn symmetric_environments_collapse() {
        // ethane: layer 1 environments of both carbons cover the same bond
        let mol = parse_smiles("CC").unwrap();
        let fp = morgan_fingerprint(&mol, 3, 1024);
        assert!(fp.count_ones() <= 2);
    }

    #[test]
    fn similar_molecules_score_between_zero_and_one() {
        let a = morgan_fingerprint(&parse_smiles("CCO").unwrap(), 2, 1024);
        let b = morgan_fingerprint(&parse_smiles("CCCO").unwrap(), 2, 1024);
        let sim = tanimoto_similarity(&a, &b);
        assert!(sim > 0.0 && sim < 1.0, "tanimoto = {sim}");
    }

    #[test]
    fn feature_fingerprint_groups_halogens() {
        // FCFP does not distinguish chlorine from bromine
        let cl = feature_morgan_fingerprint(&parse_smiles("Clc1ccccc1").unwrap(), 3, 1024);
        let br = feature_morgan_fingerprint(&parse_smiles("Brc1ccccc1").unwrap(), 3, 1024);
        assert_eq!(cl, br);
        let ecfp_cl = morgan_fingerprint(&parse_smiles("Clc1ccccc1").unwrap(), 3, 1024);
        let ecfp_br = morgan_fingerprint(&parse_smiles("Brc1ccccc1").unwrap(), 3, 1024);
        assert_ne!(ecfp_cl, ecfp_br);
    }
}
