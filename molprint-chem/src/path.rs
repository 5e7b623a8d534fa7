//! Branched-subgraph ("RDKit"-style) path fingerprints.
//!
//! Every connected set of `min_path..=max_path` bonds is hashed from its
//! bond invariants. Each hash seeds a small generator that picks
//! `bits_per_hash` bit positions.

use crate::config::FingerprintConfig;
use crate::fingerprint::{fnv1a_hash, Fingerprint};
use crate::molecule::Molecule;

/// Bonds sharing an atom with each bond.
fn bond_neighbors(mol: &Molecule) -> Vec<Vec<usize>> {
    mol.bonds
        .iter()
        .enumerate()
        .map(|(bi, bond)| {
            let mut nbrs: Vec<usize> = mol.adjacency[bond.atom1]
                .iter()
                .chain(&mol.adjacency[bond.atom2])
                .map(|&(_, other)| other)
                .filter(|&other| other != bi)
                .collect();
            nbrs.sort_unstable();
            nbrs.dedup();
            nbrs
        })
        .collect()
}

/// Enumerates connected bond subgraphs, each exactly once, by growing from
/// its smallest bond index (ESU over the line graph).
struct SubgraphEnumerator<'a> {
    neighbors: &'a [Vec<usize>],
    min_size: usize,
    max_size: usize,
    root: usize,
    subgraph: Vec<usize>,
    in_subgraph: Vec<bool>,
    /// covered[b] = number of subgraph bonds adjacent to b
    covered: Vec<u32>,
}

impl<'a> SubgraphEnumerator<'a> {
    fn new(neighbors: &'a [Vec<usize>], min_size: usize, max_size: usize) -> Self {
        let n = neighbors.len();
        SubgraphEnumerator {
            neighbors,
            min_size,
            max_size,
            root: 0,
            subgraph: Vec::with_capacity(max_size),
            in_subgraph: vec![false; n],
            covered: vec![0; n],
        }
    }

    fn run(&mut self, visit: &mut dyn FnMut(&[usize])) {
        if self.max_size == 0 {
            return;
        }
        for root in 0..self.neighbors.len() {
            self.root = root;
            let ext: Vec<usize> = self.neighbors[root].iter().copied().filter(|&u| u > root).collect();
            self.push(root);
            self.extend(ext, visit);
            self.pop(root);
        }
    }

    fn push(&mut self, bond: usize) {
        self.subgraph.push(bond);
        self.in_subgraph[bond] = true;
        for &u in &self.neighbors[bond] {
            self.covered[u] += 1;
        }
    }

    fn pop(&mut self, bond: usize) {
        self.subgraph.pop();
        self.in_subgraph[bond] = false;
        for &u in &self.neighbors[bond] {
            self.covered[u] -= 1;
        }
    }

    fn extend(&mut self, mut ext: Vec<usize>, visit: &mut dyn FnMut(&[usize])) {
        if self.subgraph.len() >= self.min_size {
            visit(&self.subgraph);
        }
        if self.subgraph.len() == self.max_size {
            return;
        }
        while let Some(w) = ext.pop() {
            let mut next = ext.clone();
            for &u in &self.neighbors[w] {
                if u > self.root && !self.in_subgraph[u] && self.covered[u] == 0 {
                    next.push(u);
                }
            }
            self.push(w);
            self.extend(next, visit);
            self.pop(w);
        }
    }
}

/// Hash of a bond subgraph from its sorted bond invariants.
fn subgraph_hash(mol: &Molecule, bonds: &[usize], degree: &mut [u64]) -> u64 {
    for &bi in bonds {
        degree[mol.bonds[bi].atom1] += 1;
        degree[mol.bonds[bi].atom2] += 1;
    }

    let atom_key = |atom: usize, degree: &[u64]| -> u64 {
        let a = &mol.atoms[atom];
        ((a.atomic_number as u64 % 128) | (a.is_aromatic as u64) << 7) << 3 | degree[atom].min(7)
    };

    let mut invariants: Vec<u64> = bonds
        .iter()
        .map(|&bi| {
            let bond = &mol.bonds[bi];
            let k1 = atom_key(bond.atom1, degree);
            let k2 = atom_key(bond.atom2, degree);
            let neighbor_count = degree[bond.atom1] + degree[bond.atom2] - 2;
            fnv1a_hash([bond.order.type_code(), k1.min(k2), k1.max(k2), neighbor_count])
        })
        .collect();
    invariants.sort_unstable();

    for &bi in bonds {
        degree[mol.bonds[bi].atom1] = 0;
        degree[mol.bonds[bi].atom2] = 0;
    }

    fnv1a_hash(std::iter::once(bonds.len() as u64).chain(invariants))
}

/// SplitMix64 step.
fn next_random(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Compute a path fingerprint over connected subgraphs of up to `max_path`
/// bonds.
pub fn path_fingerprint(mol: &Molecule, max_path: usize, config: &FingerprintConfig) -> Fingerprint {
    let mut fp = Fingerprint::new(config.nbits);
    if mol.bond_count() == 0 || max_path < config.min_path {
        return fp;
    }

    let neighbors = bond_neighbors(mol);
    let mut degree = vec![0u64; mol.atom_count()];
    let mut enumerator = SubgraphEnumerator::new(&neighbors, config.min_path, max_path);
    enumerator.run(&mut |bonds| {
        let mut state = subgraph_hash(mol, bonds, &mut degree);
        for _ in 0..config.bits_per_hash {
            let bit = next_random(&mut state) % config.nbits as u64;
            fp.set_bit(bit as usize);
        }
    });
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn subgraph_count(smiles: &str, min: usize, max: usize) -> usize {
        let mol = parse_smiles(smiles).unwrap();
        let neighbors = bond_neighbors(&mol);
        let mut count = 0;
        SubgraphEnumerator::new(&neighbors, min, max).run(&mut |_| count += 1);
        count
    }

    #[test]
    fn enumerates_linear_subpaths() {
        // pentane: 4 bonds, subpaths of length 1..=4 -> 4 + 3 + 2 + 1
        assert_eq!(subgraph_count("CCCCC", 1, 7), 10);
        assert_eq!(subgraph_count("CCCCC", 2, 2), 3);
    }

    #[test]
    fn enumerates_branched_subgraphs() {
        // isobutane: 3 bonds on one centre, every subset is connected
        assert_eq!(subgraph_count("CC(C)C", 1, 3), 7);
        // neopentane star: 2^4 - 1 connected subsets
        assert_eq!(subgraph_count("CC(C)(C)C", 1, 4), 15);
    }

    #[test]
    fn ring_subgraphs_are_unique() {
        // cyclopropane: 3 singles, 3 pairs, the whole ring
        assert_eq!(subgraph_count("C1CC1", 1, 7), 7);
    }

    #[test]
    fn larger_max_path_adds_bits() {
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let config = FingerprintConfig::default();
        let rdk5 = path_fingerprint(&mol, 5, &config);
        let rdk7 = path_fingerprint(&mol, 7, &config);
        for bit in rdk5.on_bits() {
            assert!(rdk7.get_bit(bit));
        }
        assert!(rdk7.count_ones() > rdk5.count_ones());
    }

    #[test]
    fn single_bond_sets_two_bits() {
        let mol = parse_smiles("CC").unwrap();
        let fp = path_fingerprint(&mol, 7, &FingerprintConfig::default());
        assert!(fp.count_ones() >= 1 && fp.count_ones() <= 2);
    }

    #[test]
    fn no_bonds_no_bits() {
        let mol = parse_smiles("C").unwrap();
        assert_eq!(path_fingerprint(&mol, 7, &FingerprintConfig::default()).count_ones(), 0);
    }

    #[test]
    fn isomorphic_inputs_agree() {
        let config = FingerprintConfig::default();
        let a = path_fingerprint(&parse_smiles("OCC(C)N").unwrap(), 6, &config);
        let b = path_fingerprint(&parse_smiles("NC(C)CO").unwrap(), 6, &config);
        assert_eq!(a, b);
    }
}
