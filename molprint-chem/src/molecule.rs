//! Molecular graph representation.

use std::collections::VecDeque;

use molprint_core::{Annotated, Summarizable};

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Bond order in half-bond units, so aromatic bonds stay integral.
    pub fn valence_halves(self) -> u32 {
        match self {
            BondOrder::Single => 2,
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Aromatic => 3,
        }
    }

    /// Stable small integer identifying the bond type in hashed invariants.
    pub fn type_code(self) -> u64 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 12,
        }
    }
}

/// An atom in a molecular graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MolAtom {
    /// Atomic number; 0 for the `*` wildcard atom.
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub is_aromatic: bool,
    /// Hydrogens attached to this atom that are not graph nodes.
    pub implicit_hydrogens: u8,
}

impl MolAtom {
    /// A neutral, non-aromatic atom with no hydrogens.
    pub fn new(atomic_number: u8) -> Self {
        MolAtom {
            atomic_number,
            formal_charge: 0,
            isotope: None,
            is_aromatic: false,
            implicit_hydrogens: 0,
        }
    }
}

/// A bond between two atoms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn is_aromatic(&self) -> bool {
        self.order == BondOrder::Aromatic
    }

    /// The endpoint that is not `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.atom1 == atom {
            self.atom2
        } else {
            self.atom1
        }
    }
}

/// A molecular graph with atoms, bonds, and adjacency information.
#[derive(Debug, Clone)]
pub struct Molecule {
    pub name: String,
    pub atoms: Vec<MolAtom>,
    pub bonds: Vec<Bond>,
    /// adjacency[atom_idx] = Vec<(neighbor_atom_idx, bond_idx)>
    pub adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Create a new molecule, building the adjacency list from atoms and bonds.
    pub fn new(name: String, atoms: Vec<MolAtom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, bi));
            adjacency[bond.atom2].push((bond.atom1, bi));
        }
        Molecule { name, atoms, bonds, adjacency }
    }

    /// Number of atoms (graph nodes).
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Number of non-hydrogen atoms.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number != 1).count()
    }

    /// Neighbor atom indices for a given atom.
    pub fn neighbors(&self, atom_idx: usize) -> Vec<usize> {
        self.adjacency[atom_idx].iter().map(|&(n, _)| n).collect()
    }

    /// Graph degree of an atom (number of explicit bonds).
    pub fn degree(&self, atom_idx: usize) -> usize {
        self.adjacency[atom_idx].len()
    }

    /// Index of the bond between two atoms, if any.
    pub fn bond_between(&self, a1: usize, a2: usize) -> Option<usize> {
        self.adjacency[a1]
            .iter()
            .find(|&&(n, _)| n == a2)
            .map(|&(_, bi)| bi)
    }

    /// Find the bond between two atoms, if any.
    pub fn get_bond(&self, a1: usize, a2: usize) -> Option<&Bond> {
        self.bond_between(a1, a2).map(|bi| &self.bonds[bi])
    }

    /// Hydrogens on an atom: implicit ones plus hydrogen graph neighbors.
    pub fn total_hydrogens(&self, atom_idx: usize) -> usize {
        let explicit = self.adjacency[atom_idx]
            .iter()
            .filter(|&&(n, _)| self.atoms[n].atomic_number == 1)
            .count();
        self.atoms[atom_idx].implicit_hydrogens as usize + explicit
    }

    /// Sum of bond orders to graph neighbors, aromatic bonds counting 1.5,
    /// rounded down.
    pub fn explicit_valence(&self, atom_idx: usize) -> usize {
        let halves: u32 = self.adjacency[atom_idx]
            .iter()
            .map(|&(_, bi)| self.bonds[bi].order.valence_halves())
            .sum();
        (halves / 2) as usize
    }

    /// Explicit valence plus implicit hydrogens.
    pub fn total_valence(&self, atom_idx: usize) -> usize {
        self.explicit_valence(atom_idx) + self.atoms[atom_idx].implicit_hydrogens as usize
    }

    /// Total hydrogen count over the whole molecule.
    pub fn total_hydrogen_count(&self) -> usize {
        let explicit: usize = self.atoms.iter().filter(|a| a.atomic_number == 1).count();
        let implicit: usize = self.atoms.iter().map(|a| a.implicit_hydrogens as usize).sum();
        explicit + implicit
    }

    /// Connected component label for every atom, numbered from 0.
    pub fn fragment_labels(&self) -> Vec<usize> {
        let n = self.atom_count();
        let mut labels = vec![usize::MAX; n];
        let mut next = 0;
        for start in 0..n {
            if labels[start] != usize::MAX {
                continue;
            }
            labels[start] = next;
            let mut queue = VecDeque::from([start]);
            while let Some(curr) = queue.pop_front() {
                for &(neighbor, _) in &self.adjacency[curr] {
                    if labels[neighbor] == usize::MAX {
                        labels[neighbor] = next;
                        queue.push_back(neighbor);
                    }
                }
            }
            next += 1;
        }
        labels
    }

    /// Number of disconnected fragments.
    pub fn fragment_count(&self) -> usize {
        self.fragment_labels().into_iter().max().map_or(0, |m| m + 1)
    }

    /// All-pairs topological (bond count) distances; `None` across fragments.
    pub fn distance_matrix(&self) -> Vec<Vec<Option<usize>>> {
        let n = self.atom_count();
        let mut dist = vec![vec![None; n]; n];
        for (start, row) in dist.iter_mut().enumerate() {
            row[start] = Some(0);
            let mut queue = VecDeque::from([start]);
            while let Some(curr) = queue.pop_front() {
                let d = row[curr].unwrap_or(0);
                for &(neighbor, _) in &self.adjacency[curr] {
                    if row[neighbor].is_none() {
                        row[neighbor] = Some(d + 1);
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        dist
    }
}

impl Annotated for Molecule {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Summarizable for Molecule {
    fn summary(&self) -> String {
        format!(
            "{}: {} atoms, {} bonds, {} fragment(s)",
            if self.name.is_empty() { "Molecule" } else { &self.name },
            self.atom_count(),
            self.bond_count(),
            self.fragment_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_water() -> Molecule {
        let mut o = MolAtom::new(8);
        o.implicit_hydrogens = 2;
        Molecule::new("water".into(), vec![o], vec![])
    }

    fn make_propane() -> Molecule {
        let atoms = (0..3)
            .map(|i| {
                let mut c = MolAtom::new(6);
                c.implicit_hydrogens = if i == 1 { 2 } else { 3 };
                c
            })
            .collect();
        let bonds = vec![
            Bond { atom1: 0, atom2: 1, order: BondOrder::Single },
            Bond { atom1: 1, atom2: 2, order: BondOrder::Single },
        ];
        Molecule::new("propane".into(), atoms, bonds)
    }

    #[test]
    fn construction_and_adjacency() {
        let mol = make_propane();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.neighbors(1), vec![0, 2]);
        assert_eq!(mol.degree(0), 1);
        assert_eq!(mol.bond_between(2, 1), Some(1));
        assert!(mol.get_bond(0, 2).is_none());
        assert_eq!(mol.bonds[0].other(0), 1);
    }

    #[test]
    fn hydrogens_and_valence() {
        let mol = make_water();
        assert_eq!(mol.heavy_atom_count(), 1);
        assert_eq!(mol.total_hydrogen_count(), 2);
        assert_eq!(mol.total_hydrogens(0), 2);
        assert_eq!(mol.explicit_valence(0), 0);
        assert_eq!(mol.total_valence(0), 2);
    }

    #[test]
    fn distances_and_fragments() {
        let mut mol = make_propane();
        mol.atoms.push(MolAtom::new(8));
        let mol = Molecule::new(mol.name.clone(), mol.atoms, mol.bonds);
        let d = mol.distance_matrix();
        assert_eq!(d[0][2], Some(2));
        assert_eq!(d[2][0], Some(2));
        assert_eq!(d[0][3], None);
        assert_eq!(mol.fragment_count(), 2);
        assert!(mol.summary().contains("2 fragment(s)"));
    }
}
