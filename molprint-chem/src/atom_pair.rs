//! Hashed atom-pair fingerprints.
//!
//! An atom pair is two atom codes plus the shortest-path distance between
//! them. Pairs are hashed into count buckets and each bucket records its
//! count in a few bits.

use std::collections::HashMap;

use crate::config::FingerprintConfig;
use crate::fingerprint::{fnv1a_hash, fold_hash, Fingerprint};
use crate::molecule::{BondOrder, Molecule};

const NUM_BRANCH_BITS: u32 = 3;
const NUM_PI_BITS: u32 = 2;
const NUM_TYPE_BITS: u32 = 4;
/// Width of one atom code in bits.
pub(crate) const CODE_SIZE: u32 = NUM_BRANCH_BITS + NUM_PI_BITS + NUM_TYPE_BITS;

/// Elements with their own type slot; everything else shares the last one.
const ATOM_TYPES: [u8; 15] = [5, 6, 7, 8, 9, 14, 15, 16, 17, 33, 34, 35, 51, 52, 43];

/// Pi electrons contributed to bonds: 1 for aromatic atoms, otherwise the
/// bond order beyond single summed over bonds.
fn pi_electrons(mol: &Molecule, atom_idx: usize) -> u32 {
    if mol.atoms[atom_idx].is_aromatic {
        return 1;
    }
    mol.adjacency[atom_idx]
        .iter()
        .map(|&(_, bi)| match mol.bonds[bi].order {
            BondOrder::Double => 1,
            BondOrder::Triple => 2,
            BondOrder::Single | BondOrder::Aromatic => 0,
        })
        .sum()
}

/// Atom code: branch count (minus `branch_subtract`), pi electrons and
/// element class packed into [`CODE_SIZE`] bits.
pub(crate) fn atom_code(mol: &Molecule, atom_idx: usize, branch_subtract: usize) -> u64 {
    let branches = mol.degree(atom_idx).saturating_sub(branch_subtract) as u64;
    let pi = pi_electrons(mol, atom_idx) as u64;
    let atomic_number = mol.atoms[atom_idx].atomic_number;
    let type_idx = ATOM_TYPES
        .iter()
        .position(|&z| z == atomic_number)
        .unwrap_or(ATOM_TYPES.len()) as u64;

    (branches % (1 << NUM_BRANCH_BITS))
        | (pi % (1 << NUM_PI_BITS)) << NUM_BRANCH_BITS
        | type_idx << (NUM_BRANCH_BITS + NUM_PI_BITS)
}

/// Pair code: the smaller atom code, the larger one, then the distance.
fn pair_code(code_i: u64, code_j: u64, distance: usize, max_distance: usize) -> u64 {
    let (lo, hi) = if code_i <= code_j { (code_i, code_j) } else { (code_j, code_i) };
    let distance = distance.min(max_distance) as u64;
    lo | hi << CODE_SIZE | distance << (2 * CODE_SIZE)
}

/// Compute a hashed atom-pair fingerprint over pairs at topological
/// distance `1..=config.max_pair_distance`.
pub fn atom_pair_fingerprint(mol: &Molecule, config: &FingerprintConfig) -> Fingerprint {
    let mut fp = Fingerprint::new(config.nbits);
    let n = mol.atom_count();
    if n < 2 {
        return fp;
    }

    let codes: Vec<u64> = (0..n).map(|i| atom_code(mol, i, 0)).collect();
    let distances = mol.distance_matrix();
    let buckets = config.buckets();

    let mut counts: HashMap<usize, usize> = HashMap::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let Some(d) = distances[i][j] else { continue };
            if d == 0 || d > config.max_pair_distance {
                continue;
            }
            let code = pair_code(codes[i], codes[j], d, config.max_pair_distance);
            *counts.entry(fold_hash(fnv1a_hash([code]), buckets)).or_default() += 1;
        }
    }

    for (bucket, count) in counts {
        fp.set_count_bits(bucket, count, config.bits_per_entry);
    }
    fp
}
