//! Ring perception: ring bonds, ring atoms and the smallest set of smallest
//! rings (SSSR).

use std::collections::VecDeque;

use crate::molecule::Molecule;

/// Ring membership information for one molecule.
#[derive(Debug, Clone)]
pub struct RingInfo {
    /// SSSR rings as atom index cycles, smallest first.
    pub rings: Vec<Vec<usize>>,
    /// `true` for bonds that lie on at least one cycle.
    pub bond_in_ring: Vec<bool>,
    /// `true` for atoms touching a ring bond.
    pub atom_in_ring: Vec<bool>,
    /// Number of SSSR rings containing each atom.
    pub atom_ring_count: Vec<u8>,
    /// Distinct SSSR ring sizes each atom belongs to.
    pub atom_ring_sizes: Vec<Vec<u8>>,
}

impl RingInfo {
    /// Perceive rings in `mol`.
    pub fn new(mol: &Molecule) -> Self {
        let n = mol.atom_count();
        let mut bond_in_ring = vec![false; mol.bond_count()];
        let mut atom_in_ring = vec![false; n];
        let mut rings: Vec<Vec<usize>> = Vec::new();

        // A bond is a ring bond iff its endpoints stay connected without it;
        // the shortest such detour closes the smallest ring through the bond.
        for (bond_idx, bond) in mol.bonds.iter().enumerate() {
            if let Some(mut ring) = bfs_shortest_path(mol, bond.atom1, bond.atom2, bond_idx) {
                bond_in_ring[bond_idx] = true;
                atom_in_ring[bond.atom1] = true;
                atom_in_ring[bond.atom2] = true;
                normalize_ring(&mut ring);
                if !rings.contains(&ring) {
                    rings.push(ring);
                }
            }
        }

        rings.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        let expected = cyclomatic_number(mol);
        rings.truncate(expected);

        let mut atom_ring_count = vec![0u8; n];
        let mut atom_ring_sizes = vec![Vec::new(); n];
        for ring in &rings {
            let size = ring.len().min(u8::MAX as usize) as u8;
            for &idx in ring {
                atom_ring_count[idx] = atom_ring_count[idx].saturating_add(1);
                if !atom_ring_sizes[idx].contains(&size) {
                    atom_ring_sizes[idx].push(size);
                }
            }
        }

        RingInfo { rings, bond_in_ring, atom_in_ring, atom_ring_count, atom_ring_sizes }
    }

    /// Number of SSSR rings.
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Number of SSSR rings whose every bond is aromatic.
    pub fn aromatic_ring_count(&self, mol: &Molecule) -> usize {
        self.rings
            .iter()
            .filter(|ring| {
                (0..ring.len()).all(|i| {
                    mol.get_bond(ring[i], ring[(i + 1) % ring.len()])
                        .is_some_and(|b| b.is_aromatic())
                })
            })
            .count()
    }
}

/// Expected SSSR size: bonds − atoms + connected components.
fn cyclomatic_number(mol: &Molecule) -> usize {
    let rank = mol.bond_count() as isize - mol.atom_count() as isize + mol.fragment_count() as isize;
    rank.max(0) as usize
}

/// BFS from `start` to `end` that never crosses `excluded_bond`.
fn bfs_shortest_path(
    mol: &Molecule,
    start: usize,
    end: usize,
    excluded_bond: usize,
) -> Option<Vec<usize>> {
    let n = mol.atom_count();
    let mut visited = vec![false; n];
    let mut parent = vec![usize::MAX; n];
    let mut queue = VecDeque::new();

    visited[start] = true;
    queue.push_back(start);

    while let Some(curr) = queue.pop_front() {
        if curr == end {
            let mut path = Vec::new();
            let mut node = end;
            while node != start {
                path.push(node);
                node = parent[node];
            }
            path.push(start);
            path.reverse();
            return Some(path);
        }

        for &(neighbor, bond_idx) in &mol.adjacency[curr] {
            if bond_idx == excluded_bond || visited[neighbor] {
                continue;
            }
            visited[neighbor] = true;
            parent[neighbor] = curr;
            queue.push_back(neighbor);
        }
    }

    None
}

/// Rotate a ring to start at its smallest index and walk toward the smaller
/// neighbor, so equal cycles compare equal.
fn normalize_ring(ring: &mut [usize]) {
    let Some(min_pos) = ring.iter().enumerate().min_by_key(|&(_, &v)| v).map(|(i, _)| i) else {
        return;
    };
    ring.rotate_left(min_pos);
    let n = ring.len();
    if n > 2 && ring[n - 1] < ring[1] {
        ring[1..].reverse();
    }
}
