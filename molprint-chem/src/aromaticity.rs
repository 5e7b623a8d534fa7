//! Aromaticity perception for Kekulé input.
//!
//! A ring is aromatic when every atom can join the pi system and the ring
//! holds 4n + 2 pi electrons. Fused pairs of rings that fail on their own are
//! tested as one system, which covers azulene-like cores. Atoms already
//! written aromatic are left as they are.

use std::collections::BTreeSet;

use crate::molecule::{BondOrder, Molecule};
use crate::ring::RingInfo;

/// Elements allowed in a perceived aromatic ring.
fn aromatic_element(atomic_number: u8) -> bool {
    matches!(atomic_number, 5 | 6 | 7 | 8 | 15 | 16 | 33 | 34 | 52)
}

/// Pi electrons `atom_idx` gives to a ring, or `None` if it cannot be part of
/// an aromatic ring.
fn pi_electrons(mol: &Molecule, rings: &RingInfo, atom_idx: usize) -> Option<u32> {
    let atom = &mol.atoms[atom_idx];
    if atom.is_aromatic || !rings.atom_in_ring[atom_idx] || !aromatic_element(atom.atomic_number) {
        return None;
    }

    let mut ring_double = false;
    let mut exocyclic_hetero_double = false;
    for &(nbr, bond_idx) in &mol.adjacency[atom_idx] {
        match mol.bonds[bond_idx].order {
            BondOrder::Single => {}
            BondOrder::Double if rings.bond_in_ring[bond_idx] => {
                if ring_double {
                    return None;
                }
                ring_double = true;
            }
            BondOrder::Double if matches!(mol.atoms[nbr].atomic_number, 7 | 8 | 16) => {
                exocyclic_hetero_double = true;
            }
            _ => return None,
        }
    }

    if ring_double {
        return Some(1);
    }
    if exocyclic_hetero_double {
        return Some(0);
    }

    // No double bond: either a lone pair or an empty orbital.
    let connections = mol.degree(atom_idx) + atom.implicit_hydrogens as usize;
    match (atom.atomic_number, atom.formal_charge) {
        (6, -1) => Some(2),
        (6, 1) | (5, 0) => Some(0),
        (7 | 15 | 33, 0) if connections == 3 => Some(2),
        (8 | 16 | 34 | 52, 0) if connections == 2 => Some(2),
        _ => None,
    }
}

fn huckel(electrons: u32) -> bool {
    electrons >= 2 && (electrons - 2) % 4 == 0
}

/// Bond indices around a ring cycle.
fn ring_bonds(mol: &Molecule, ring: &[usize]) -> Vec<usize> {
    (0..ring.len())
        .filter_map(|i| mol.bond_between(ring[i], ring[(i + 1) % ring.len()]))
        .collect()
}

/// Indices into `rings.rings` of the rings perceived as aromatic.
pub fn find_aromatic_rings(mol: &Molecule, rings: &RingInfo) -> Vec<usize> {
    let electrons: Vec<Option<u32>> = (0..mol.atom_count()).map(|i| pi_electrons(mol, rings, i)).collect();
    let candidates: Vec<usize> = (0..rings.rings.len())
        .filter(|&r| rings.rings[r].iter().all(|&a| electrons[a].is_some()))
        .collect();
    let count = |atoms: &[usize]| atoms.iter().map(|&a| electrons[a].unwrap_or(0)).sum::<u32>();

    let mut aromatic = vec![false; rings.rings.len()];
    for &r in &candidates {
        aromatic[r] = huckel(count(&rings.rings[r]));
    }

    for (i, &a) in candidates.iter().enumerate() {
        for &b in &candidates[i + 1..] {
            if aromatic[a] && aromatic[b] {
                continue;
            }
            let bonds_a = ring_bonds(mol, &rings.rings[a]);
            if !ring_bonds(mol, &rings.rings[b]).iter().any(|bond| bonds_a.contains(bond)) {
                continue;
            }
            let system: BTreeSet<usize> = rings.rings[a].iter().chain(&rings.rings[b]).copied().collect();
            let system: Vec<usize> = system.into_iter().collect();
            if huckel(count(&system)) {
                aromatic[a] = true;
                aromatic[b] = true;
            }
        }
    }

    (0..rings.rings.len()).filter(|&r| aromatic[r]).collect()
}

/// Mark the atoms and ring bonds of every perceived aromatic ring.
///
/// Hydrogen counts are kept: a Kekulé structure already carries the same
/// counts as its aromatic spelling.
pub fn set_aromaticity(mol: &mut Molecule, rings: &RingInfo) {
    for r in find_aromatic_rings(mol, rings) {
        let ring = &rings.rings[r];
        for bond_idx in ring_bonds(mol, ring) {
            mol.bonds[bond_idx].order = BondOrder::Aromatic;
        }
        for &atom_idx in ring {
            mol.atoms[atom_idx].is_aromatic = true;
        }
    }
}
