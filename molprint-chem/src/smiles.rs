//! SMILES string parser.

use std::collections::BTreeMap;

use molprint_core::{MolprintError, Result};

use crate::aromaticity::set_aromaticity;
use crate::element::{element_by_number, element_by_symbol};
use crate::molecule::{Bond, BondOrder, MolAtom, Molecule};
use crate::ring::RingInfo;

/// Parse a SMILES string into a `Molecule`.
pub fn parse_smiles(smiles: &str) -> Result<Molecule> {
    parse_smiles_named(smiles, "")
}

/// Parse a SMILES string into a `Molecule` with a given name.
pub fn parse_smiles_named(smiles: &str, name: &str) -> Result<Molecule> {
    if smiles.trim().is_empty() {
        return Err(MolprintError::Parse("empty SMILES string".into()));
    }
    let mut parser = SmilesParser::new(smiles);
    parser.parse()?;
    parser.resolve_ring_closures()?;
    parser.compute_implicit_hydrogens()?;
    let (atoms, bonds) = fold_explicit_hydrogens(parser.atoms, parser.bonds)?;
    let mut mol = Molecule::new(name.to_string(), atoms, bonds);
    let rings = RingInfo::new(&mol);
    check_aromatic_atoms_in_rings(&mol, &rings)?;
    demote_acyclic_aromatic_bonds(&mut mol, &rings);
    set_aromaticity(&mut mol, &rings);
    Ok(mol)
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<MolAtom>,
    /// bracket[atom_idx] is true when the hydrogen count was written explicitly
    bracket: Vec<bool>,
    bonds: Vec<Bond>,
    /// ring_closures[digit] = (atom_idx, Option<BondOrder>)
    ring_closures: BTreeMap<u16, (usize, Option<BondOrder>)>,
    /// Stack of atom indices for branch handling
    stack: Vec<usize>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondOrder>,
}

impl<'a> SmilesParser<'a> {
    fn new(input: &'a str) -> Self {
        SmilesParser {
            input: input.trim().as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bracket: Vec::new(),
            bonds: Vec::new(),
            ring_closures: BTreeMap::new(),
            stack: Vec::new(),
            prev_atom: None,
            pending_bond: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, msg: impl std::fmt::Display) -> MolprintError {
        MolprintError::Parse(format!("{msg} at position {}", self.pos))
    }

    fn parse(&mut self) -> Result<()> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    self.advance();
                    let prev = self.prev_atom.ok_or_else(|| self.error("branch without preceding atom"))?;
                    self.stack.push(prev);
                }
                b')' => {
                    self.advance();
                    let top = self.stack.pop().ok_or_else(|| self.error("unmatched ')'"))?;
                    self.prev_atom = Some(top);
                    self.pending_bond = None;
                }
                b'-' | b'/' | b'\\' => {
                    // Directional bonds are single bonds; stereo is not tracked.
                    self.advance();
                    self.pending_bond = Some(BondOrder::Single);
                }
                b'=' => {
                    self.advance();
                    self.pending_bond = Some(BondOrder::Double);
                }
                b'#' => {
                    self.advance();
                    self.pending_bond = Some(BondOrder::Triple);
                }
                b':' => {
                    self.advance();
                    self.pending_bond = Some(BondOrder::Aromatic);
                }
                b'%' => {
                    self.advance();
                    let ring_num = self.parse_two_digit_ring()?;
                    self.handle_ring_closure(ring_num)?;
                }
                b'[' => self.parse_bracket_atom()?,
                b'*' => {
                    self.advance();
                    self.push_atom(MolAtom::new(0), true)?;
                }
                b'.' => {
                    self.advance();
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond before '.'"));
                    }
                    self.prev_atom = None;
                }
                ch if ch.is_ascii_digit() => {
                    self.advance();
                    self.handle_ring_closure((ch - b'0') as u16)?;
                }
                ch if is_organic_atom_start(ch) => self.parse_organic_atom()?,
                ch => {
                    return Err(self.error(format!("unexpected character '{}'", ch as char)));
                }
            }
        }
        if self.pending_bond.is_some() {
            return Err(self.error("dangling bond at end of SMILES"));
        }
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<()> {
        let ch = self.advance().ok_or_else(|| self.error("unexpected end of SMILES"))?;
        let is_aromatic = ch.is_ascii_lowercase();

        let symbol = match ch {
            b'B' if self.peek() == Some(b'r') => {
                self.advance();
                "Br"
            }
            b'C' if self.peek() == Some(b'l') => {
                self.advance();
                "Cl"
            }
            b'B' | b'b' => "B",
            b'C' | b'c' => "C",
            b'N' | b'n' => "N",
            b'O' | b'o' => "O",
            b'P' | b'p' => "P",
            b'S' | b's' => "S",
            b'F' => "F",
            b'I' => "I",
            _ => return Err(self.error(format!("unknown organic atom '{}'", ch as char))),
        };

        let elem = element_by_symbol(symbol)
            .ok_or_else(|| self.error(format!("unknown element '{symbol}'")))?;
        let mut atom = MolAtom::new(elem.atomic_number);
        atom.is_aromatic = is_aromatic;
        self.push_atom(atom, false)
    }

    fn parse_bracket_atom(&mut self) -> Result<()> {
        self.advance(); // '['

        let isotope = self.parse_optional_number();

        let first = self
            .advance()
            .ok_or_else(|| self.error("unexpected end of SMILES in bracket atom"))?;
        let (atomic_number, is_aromatic) = if first == b'*' {
            (0, false)
        } else if first.is_ascii_alphabetic() {
            self.bracket_symbol(first)?
        } else {
            return Err(self.error(format!("expected element symbol, found '{}'", first as char)));
        };

        // Chirality (@, @@, @TH1, ...) is consumed; fingerprints ignore it.
        while self.peek() == Some(b'@') {
            self.advance();
            if let (Some(a), Some(b)) = (self.peek(), self.peek_at(1)) {
                if matches!(&[a, b], b"TH" | b"AL" | b"SP" | b"TB" | b"OH") {
                    self.pos += 2;
                    self.parse_optional_number();
                }
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.advance();
            hydrogens = match self.parse_optional_number() {
                Some(n) => u8::try_from(n).map_err(|_| self.error("hydrogen count too large"))?,
                None => 1,
            };
        }

        let charge = self.parse_charge()?;

        // Atom class `:n` carries no chemistry.
        if self.peek() == Some(b':') {
            self.advance();
            if self.parse_optional_number().is_none() {
                return Err(self.error("expected atom class number after ':'"));
            }
        }

        if self.advance() != Some(b']') {
            return Err(self.error("expected ']' in bracket atom"));
        }

        let atom = MolAtom {
            atomic_number,
            formal_charge: charge,
            isotope: isotope
                .map(|n| u16::try_from(n).map_err(|_| self.error("isotope too large")))
                .transpose()?,
            is_aromatic,
            implicit_hydrogens: hydrogens,
        };
        self.push_atom(atom, true)
    }

    /// Element symbol inside brackets; lowercase means aromatic.
    fn bracket_symbol(&mut self, first: u8) -> Result<(u8, bool)> {
        let is_aromatic = first.is_ascii_lowercase();
        let upper = first.to_ascii_uppercase() as char;

        if let Some(next) = self.peek().filter(|c| c.is_ascii_lowercase()) {
            let two = format!("{upper}{}", next as char);
            let aromatic_ok = !is_aromatic || matches!(two.as_str(), "Se" | "As" | "Te");
            if aromatic_ok {
                if let Some(elem) = element_by_symbol(&two) {
                    self.advance();
                    return Ok((elem.atomic_number, is_aromatic));
                }
            }
        }

        if is_aromatic && !matches!(first, b'b' | b'c' | b'n' | b'o' | b'p' | b's') {
            return Err(self.error(format!("'{}' cannot be aromatic", first as char)));
        }
        let elem = element_by_symbol(&upper.to_string())
            .ok_or_else(|| self.error(format!("unknown element '{upper}'")))?;
        Ok((elem.atomic_number, is_aromatic))
    }

    fn parse_charge(&mut self) -> Result<i8> {
        let sign: i8 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Ok(0),
        };
        let symbol = self.advance();
        if let Some(n) = self.parse_optional_number() {
            let n = i8::try_from(n).map_err(|_| self.error("charge too large"))?;
            return Ok(sign * n);
        }
        let mut magnitude = 1i8;
        while self.peek() == symbol {
            self.advance();
            magnitude = magnitude.saturating_add(1);
        }
        Ok(sign * magnitude)
    }

    fn parse_optional_number(&mut self) -> Option<u32> {
        let mut n: u32 = 0;
        let mut found = false;
        while let Some(ch) = self.peek().filter(u8::is_ascii_digit) {
            self.advance();
            n = n.saturating_mul(10).saturating_add((ch - b'0') as u32);
            found = true;
        }
        found.then_some(n)
    }

    fn parse_two_digit_ring(&mut self) -> Result<u16> {
        match (self.peek(), self.peek_at(1)) {
            (Some(d1), Some(d2)) if d1.is_ascii_digit() && d2.is_ascii_digit() => {
                self.pos += 2;
                Ok((d1 - b'0') as u16 * 10 + (d2 - b'0') as u16)
            }
            _ => Err(self.error("expected two digits after '%'")),
        }
    }

    fn handle_ring_closure(&mut self, ring_num: u16) -> Result<()> {
        let current = self
            .prev_atom
            .ok_or_else(|| self.error("ring closure without preceding atom"))?;

        if let Some((open_atom, open_bond)) = self.ring_closures.remove(&ring_num) {
            if open_atom == current {
                return Err(self.error(format!("ring closure {ring_num} bonds an atom to itself")));
            }
            if self.bonds.iter().any(|b| {
                (b.atom1 == open_atom && b.atom2 == current) || (b.atom1 == current && b.atom2 == open_atom)
            }) {
                return Err(self.error(format!("ring closure {ring_num} duplicates an existing bond")));
            }
            let pending = self.pending_bond.take();
            if let (Some(a), Some(b)) = (pending, open_bond) {
                if a != b {
                    return Err(self.error(format!("conflicting bond orders on ring closure {ring_num}")));
                }
            }
            let order = pending.or(open_bond).unwrap_or_else(|| self.default_order(open_atom, current));
            self.bonds.push(Bond { atom1: open_atom, atom2: current, order });
        } else {
            self.ring_closures.insert(ring_num, (current, self.pending_bond.take()));
        }
        Ok(())
    }

    fn default_order(&self, a1: usize, a2: usize) -> BondOrder {
        if self.atoms[a1].is_aromatic && self.atoms[a2].is_aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn push_atom(&mut self, atom: MolAtom, bracket: bool) -> Result<()> {
        let atom_idx = self.atoms.len();
        self.atoms.push(atom);
        self.bracket.push(bracket);
        if let Some(prev) = self.prev_atom {
            let order = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.default_order(prev, atom_idx));
            self.bonds.push(Bond { atom1: prev, atom2: atom_idx, order });
        } else if self.pending_bond.is_some() {
            return Err(self.error("bond without preceding atom"));
        }
        self.prev_atom = Some(atom_idx);
        Ok(())
    }

    fn resolve_ring_closures(&self) -> Result<()> {
        if !self.ring_closures.is_empty() {
            let open: Vec<_> = self.ring_closures.keys().collect();
            return Err(MolprintError::Parse(format!("unmatched ring closure(s): {open:?}")));
        }
        if !self.stack.is_empty() {
            return Err(MolprintError::Parse(format!(
                "{} unmatched '(' in SMILES",
                self.stack.len()
            )));
        }
        Ok(())
    }

    /// Assign implicit hydrogens to organic-subset atoms from their default
    /// valences. Bracket atoms keep the count written in the SMILES.
    fn compute_implicit_hydrogens(&mut self) -> Result<()> {
        let mut halves = vec![0u32; self.atoms.len()];
        let mut aromatic_bonds = vec![0u32; self.atoms.len()];
        let mut other_orders = vec![0u32; self.atoms.len()];
        for bond in &self.bonds {
            for atom in [bond.atom1, bond.atom2] {
                halves[atom] += bond.order.valence_halves();
                if bond.is_aromatic() {
                    aromatic_bonds[atom] += 1;
                } else {
                    other_orders[atom] += bond.order.valence_halves() / 2;
                }
            }
        }

        for i in 0..self.atoms.len() {
            if self.bracket[i] {
                continue;
            }
            let atom = &self.atoms[i];
            let Some(elem) = element_by_number(atom.atomic_number) else {
                continue;
            };
            let valences = elem.default_valences();
            let Some(&lowest) = valences.first() else {
                continue;
            };

            let hydrogens = if atom.is_aromatic {
                // One valence electron goes to the pi system.
                let used = aromatic_bonds[i] + other_orders[i];
                (lowest as u32).saturating_sub(1).saturating_sub(used)
            } else {
                let explicit = halves[i] / 2;
                let target = valences.iter().map(|&v| v as u32).find(|&v| v >= explicit).ok_or_else(|| {
                    MolprintError::Parse(format!(
                        "explicit valence {explicit} on atom {i} ({}) exceeds the maximum allowed",
                        elem.symbol
                    ))
                })?;
                target - explicit
            };
            self.atoms[i].implicit_hydrogens = hydrogens as u8;
        }
        Ok(())
    }
}

/// Fold `[H]` atoms that hang off exactly one heavy atom into that atom's
/// hydrogen count, reindexing the remaining graph.
fn fold_explicit_hydrogens(mut atoms: Vec<MolAtom>, bonds: Vec<Bond>) -> Result<(Vec<MolAtom>, Vec<Bond>)> {
    let mut degree = vec![0usize; atoms.len()];
    for bond in &bonds {
        degree[bond.atom1] += 1;
        degree[bond.atom2] += 1;
    }

    let mut removable = vec![false; atoms.len()];
    for bond in &bonds {
        for (h, heavy) in [(bond.atom1, bond.atom2), (bond.atom2, bond.atom1)] {
            let a = &atoms[h];
            let plain_h = a.atomic_number == 1
                && a.isotope.is_none()
                && a.formal_charge == 0
                && a.implicit_hydrogens == 0
                && degree[h] == 1
                && bond.order == BondOrder::Single;
            if plain_h && atoms[heavy].atomic_number > 1 {
                removable[h] = true;
            }
        }
    }
    if !removable.iter().any(|&r| r) {
        return Ok((atoms, bonds));
    }

    for bond in &bonds {
        let heavy = if removable[bond.atom1] {
            bond.atom2
        } else if removable[bond.atom2] {
            bond.atom1
        } else {
            continue;
        };
        atoms[heavy].implicit_hydrogens = atoms[heavy]
            .implicit_hydrogens
            .checked_add(1)
            .ok_or_else(|| MolprintError::Parse("hydrogen count too large".into()))?;
    }

    let mut new_index = vec![usize::MAX; atoms.len()];
    let mut kept = Vec::with_capacity(atoms.len());
    for (i, atom) in atoms.into_iter().enumerate() {
        if !removable[i] {
            new_index[i] = kept.len();
            kept.push(atom);
        }
    }
    let bonds = bonds
        .into_iter()
        .filter(|b| !removable[b.atom1] && !removable[b.atom2])
        .map(|b| Bond { atom1: new_index[b.atom1], atom2: new_index[b.atom2], order: b.order })
        .collect();
    Ok((kept, bonds))
}

fn check_aromatic_atoms_in_rings(mol: &Molecule, rings: &RingInfo) -> Result<()> {
    if let Some(i) = (0..mol.atom_count()).find(|&i| mol.atoms[i].is_aromatic && !rings.atom_in_ring[i]) {
        return Err(MolprintError::Parse(format!("non-ring atom {i} marked aromatic")));
    }
    Ok(())
}

/// Aromatic bonds exist only inside rings, so the link between two aromatic
/// rings is single however it was written.
fn demote_acyclic_aromatic_bonds(mol: &mut Molecule, rings: &RingInfo) {
    for (bond, &in_ring) in mol.bonds.iter_mut().zip(&rings.bond_in_ring) {
        if bond.order == BondOrder::Aromatic && !in_ring {
            bond.order = BondOrder::Single;
        }
    }
}

fn is_organic_atom_start(ch: u8) -> bool {
    matches!(
        ch,
        b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I'
            | b'b' | b'c' | b'n' | b'o' | b'p' | b's'
    )
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for valid simple SMILES: chains of aliphatic organic atoms
    fn simple_smiles() -> impl Strategy<Value = String> {
        let atoms = prop_oneof![Just("C"), Just("N"), Just("O"), Just("S"), Just("Cl")];
        proptest::collection::vec(atoms, 1..=20).prop_map(|parts| parts.join(""))
    }

    proptest! {
        #[test]
        fn parse_smiles_does_not_panic(s in "\\PC{0,100}") {
            let _ = parse_smiles(&s);
        }

        #[test]
        fn atom_count_positive_on_success(smi in simple_smiles()) {
            if let Ok(mol) = parse_smiles(&smi) {
                prop_assert!(mol.atom_count() > 0);
                prop_assert_eq!(mol.fragment_count(), 1);
            }
        }
    }
}
