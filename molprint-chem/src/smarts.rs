//! SMARTS pattern parsing and substructure matching.
//!
//! SMARTS extends SMILES with atom/bond query primitives and logical operators
//! for flexible substructure searching. Atom expressions follow the usual
//! precedence: `!` binds tightest, then `&` (or juxtaposition), then `,`,
//! then `;`.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use molprint_core::{MolprintError, Result};

use crate::element::element_by_symbol;
use crate::molecule::{BondOrder, Molecule};
use crate::ring::RingInfo;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A primitive atom query in SMARTS.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomPrimitive {
    /// Wildcard, matches any atom (`*`).
    Wildcard,
    /// Match by atomic number (`#6`).
    AtomicNum(u8),
    /// Element with aromaticity (`C` is aliphatic carbon, `c` aromatic).
    Element { atomic_number: u8, aromatic: bool },
    /// Match aromatic atoms (`a`).
    Aromatic,
    /// Match aliphatic atoms (`A`).
    Aliphatic,
    /// Match by mass number (`13C`).
    Isotope(u16),
    /// Explicit connections (`D2`).
    Degree(u8),
    /// Total hydrogen count (`H1`).
    TotalHCount(u8),
    /// Implicit hydrogen count (`h1`); bare `h` means at least one.
    ImplicitHCount(Option<u8>),
    /// Atom in any ring (`R`, bare `r`).
    InRing,
    /// Number of SSSR rings containing the atom (`R2`); `R0` means acyclic.
    RingCount(u8),
    /// Atom in an SSSR ring of the given size (`r5`).
    RingSize(u8),
    /// Total connections including hydrogens (`X3`).
    Connectivity(u8),
    /// Total valence (`v3`).
    Valence(u8),
    /// Formal charge (`+1`, `-`, `+0`).
    Charge(i8),
}

/// A logical atom expression in SMARTS.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    Prim(AtomPrimitive),
    Not(Box<AtomExpr>),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
    /// Recursive SMARTS (`$(...)`): the atom must be the first atom of a
    /// match of the inner pattern.
    Recursive(Box<SmartsPattern>),
}

/// A bond expression in SMARTS.
#[derive(Debug, Clone, PartialEq)]
pub enum BondExpr {
    Single,
    Double,
    Triple,
    Aromatic,
    /// Unspecified bond: single or aromatic.
    SingleOrAromatic,
    Ring,
    Any,
    Not(Box<BondExpr>),
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
}

/// A bond between two atoms in a SMARTS pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartsBond {
    pub atom1: usize,
    pub atom2: usize,
    pub expr: BondExpr,
}

/// A parsed SMARTS pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartsPattern {
    pub atoms: Vec<AtomExpr>,
    pub bonds: Vec<SmartsBond>,
    adjacency: Vec<Vec<(usize, usize)>>,
    /// Visit order for matching; each atom after a component's first has an
    /// earlier neighbor.
    order: Vec<usize>,
    /// anchor[p] = an earlier-visited neighbor of pattern atom p
    anchor: Vec<Option<usize>>,
}

impl SmartsPattern {
    fn new(atoms: Vec<AtomExpr>, bonds: Vec<SmartsBond>) -> Self {
        let n = atoms.len();
        let mut adjacency = vec![Vec::new(); n];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, bi));
            adjacency[bond.atom2].push((bond.atom1, bi));
        }

        let mut order = Vec::with_capacity(n);
        let mut anchor = vec![None; n];
        let mut seen = vec![false; n];
        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut queue = VecDeque::from([start]);
            while let Some(curr) = queue.pop_front() {
                order.push(curr);
                for &(neighbor, _) in &adjacency[curr] {
                    if !seen[neighbor] {
                        seen[neighbor] = true;
                        anchor[neighbor] = Some(curr);
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        SmartsPattern { atoms, bonds, adjacency, order, anchor }
    }

    /// Number of pattern atoms.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct SmartsParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<AtomExpr>,
    bonds: Vec<SmartsBond>,
    stack: Vec<usize>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondExpr>,
    ring_closures: BTreeMap<u16, (usize, Option<BondExpr>)>,
}

impl<'a> SmartsParser<'a> {
    fn new(input: &'a str) -> Self {
        SmartsParser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            stack: Vec::new(),
            prev_atom: None,
            pending_bond: None,
            ring_closures: BTreeMap::new(),
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
        MolprintError::Parse(format!("{msg} at position {} in SMARTS", self.pos))
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
                    self.prev_atom = Some(self.stack.pop().ok_or_else(|| self.error("unmatched ')'"))?);
                    self.pending_bond = None;
                }
                b'%' => {
                    self.advance();
                    let ring_num = self.parse_two_digit_ring()?;
                    self.handle_ring_closure(ring_num)?;
                }
                b'[' => {
                    self.advance();
                    let expr = self.parse_atom_low_and()?;
                    if self.advance() != Some(b']') {
                        return Err(self.error("expected ']' in bracket atom"));
                    }
                    self.push_atom(expr)?;
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
                ch if is_bond_start(ch) => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("consecutive bond expressions"));
                    }
                    self.pending_bond = Some(self.parse_bond_low_and()?);
                }
                _ => {
                    let expr = self.parse_unbracketed_atom()?;
                    self.push_atom(expr)?;
                }
            }
        }
        if self.pending_bond.is_some() {
            return Err(self.error("dangling bond"));
        }
        if !self.stack.is_empty() {
            return Err(self.error("unmatched '('"));
        }
        if !self.ring_closures.is_empty() {
            let open: Vec<_> = self.ring_closures.keys().collect();
            return Err(MolprintError::Parse(format!("unmatched ring closure(s) in SMARTS: {open:?}")));
        }
        Ok(())
    }

    fn parse_unbracketed_atom(&mut self) -> Result<AtomExpr> {
        let ch = self.advance().ok_or_else(|| self.error("unexpected end"))?;
        let (atomic_number, aromatic) = match ch {
            b'*' => return Ok(AtomExpr::Prim(AtomPrimitive::Wildcard)),
            b'a' => return Ok(AtomExpr::Prim(AtomPrimitive::Aromatic)),
            b'A' => return Ok(AtomExpr::Prim(AtomPrimitive::Aliphatic)),
            b'B' if self.peek() == Some(b'r') => {
                self.advance();
                (35, false)
            }
            b'C' if self.peek() == Some(b'l') => {
                self.advance();
                (17, false)
            }
            b'B' => (5, false),
            b'C' => (6, false),
            b'N' => (7, false),
            b'O' => (8, false),
            b'F' => (9, false),
            b'P' => (15, false),
            b'S' => (16, false),
            b'I' => (53, false),
            b'b' => (5, true),
            b'c' => (6, true),
            b'n' => (7, true),
            b'o' => (8, true),
            b'p' => (15, true),
            b's' => (16, true),
            _ => {
                self.pos -= 1;
                return Err(self.error(format!("unexpected character '{}'", ch as char)));
            }
        };
        Ok(AtomExpr::Prim(AtomPrimitive::Element { atomic_number, aromatic }))
    }

    fn push_atom(&mut self, expr: AtomExpr) -> Result<()> {
        let idx = self.atoms.len();
        self.atoms.push(expr);
        if let Some(prev) = self.prev_atom {
            let expr = self.pending_bond.take().unwrap_or(BondExpr::SingleOrAromatic);
            self.bonds.push(SmartsBond { atom1: prev, atom2: idx, expr });
        } else if self.pending_bond.is_some() {
            return Err(self.error("bond without preceding atom"));
        }
        self.prev_atom = Some(idx);
        Ok(())
    }

    // Atom expression grammar:
    //   low_and  = or (';' or)*
    //   or       = high_and (',' high_and)*
    //   high_and = not (('&' | implicit) not)*
    //   not      = '!' not | primitive

    fn parse_atom_low_and(&mut self) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_atom_or()?];
        while self.peek() == Some(b';') {
            self.advance();
            terms.push(self.parse_atom_or()?);
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn parse_atom_or(&mut self) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_atom_high_and()?];
        while self.peek() == Some(b',') {
            self.advance();
            terms.push(self.parse_atom_high_and()?);
        }
        Ok(collapse(terms, AtomExpr::Or))
    }

    fn parse_atom_high_and(&mut self) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_atom_not()?];
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.advance();
                    terms.push(self.parse_atom_not()?);
                }
                Some(b']' | b',' | b';') | None => break,
                Some(_) => terms.push(self.parse_atom_not()?),
            }
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn parse_atom_not(&mut self) -> Result<AtomExpr> {
        if self.peek() == Some(b'!') {
            self.advance();
            Ok(AtomExpr::Not(Box::new(self.parse_atom_not()?)))
        } else {
            self.parse_atom_primitive()
        }
    }

    fn parse_atom_primitive(&mut self) -> Result<AtomExpr> {
        let ch = self.peek().ok_or_else(|| self.error("unexpected end in atom expression"))?;
        let prim = match ch {
            b'$' => return self.parse_recursive(),
            b'*' => {
                self.advance();
                AtomPrimitive::Wildcard
            }
            b'#' => {
                self.advance();
                let n = self.parse_number()?;
                AtomPrimitive::AtomicNum(u8::try_from(n).map_err(|_| self.error("atomic number too large"))?)
            }
            b'0'..=b'9' => {
                let n = self.parse_number()?;
                AtomPrimitive::Isotope(u16::try_from(n).map_err(|_| self.error("isotope too large"))?)
            }
            b'+' | b'-' => AtomPrimitive::Charge(self.parse_charge()?),
            b'@' => {
                // Chirality is not matched.
                while matches!(self.peek(), Some(b'@' | b'?')) {
                    self.advance();
                }
                AtomPrimitive::Wildcard
            }
            b'H' if self.at_bracket_head() && !self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.advance();
                AtomPrimitive::Element { atomic_number: 1, aromatic: false }
            }
            ch if ch.is_ascii_uppercase() => self.parse_uppercase()?,
            ch if ch.is_ascii_lowercase() => self.parse_lowercase()?,
            ch => return Err(self.error(format!("unexpected '{}' in atom expression", ch as char))),
        };
        Ok(AtomExpr::Prim(prim))
    }

    fn parse_recursive(&mut self) -> Result<AtomExpr> {
        self.advance(); // '$'
        if self.advance() != Some(b'(') {
            return Err(self.error("expected '(' after '$'"));
        }
        let start = self.pos;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Some(b'(') => depth += 1,
                Some(b')') => depth -= 1,
                Some(_) => {}
                None => return Err(self.error("unmatched '(' in recursive SMARTS")),
            }
        }
        let inner = std::str::from_utf8(&self.input[start..self.pos - 1])
            .map_err(|_| self.error("invalid UTF-8 in recursive SMARTS"))?;
        Ok(AtomExpr::Recursive(Box::new(parse_smarts(inner)?)))
    }

    /// True when only an isotope separates the cursor from the opening `[`.
    fn at_bracket_head(&self) -> bool {
        let mut i = self.pos;
        while i > 0 && self.input[i - 1].is_ascii_digit() {
            i -= 1;
        }
        i > 0 && self.input[i - 1] == b'['
    }

    fn parse_uppercase(&mut self) -> Result<AtomPrimitive> {
        let ch = self.input[self.pos];
        if let Some(next) = self.peek_at(1).filter(u8::is_ascii_lowercase) {
            let two = format!("{}{}", ch as char, next as char);
            // `Nh` and `Hs` read as N with `h` and H with `s`. `Cs` and `Sc`
            // stay caesium and scandium.
            let split = matches!(two.as_str(), "Nh" | "Hs");
            if let Some(elem) = element_by_symbol(&two).filter(|_| !split) {
                self.pos += 2;
                return Ok(AtomPrimitive::Element { atomic_number: elem.atomic_number, aromatic: false });
            }
        }
        self.advance();
        let prim = match ch {
            b'A' => AtomPrimitive::Aliphatic,
            b'D' => AtomPrimitive::Degree(self.parse_count(1)?),
            b'H' => AtomPrimitive::TotalHCount(self.parse_count(1)?),
            b'X' => AtomPrimitive::Connectivity(self.parse_count(1)?),
            b'R' => match self.parse_optional_number() {
                Some(n) => AtomPrimitive::RingCount(u8::try_from(n).map_err(|_| self.error("ring count too large"))?),
                None => AtomPrimitive::InRing,
            },
            _ => {
                let elem = element_by_symbol(&(ch as char).to_string())
                    .ok_or_else(|| self.error(format!("unknown element '{}'", ch as char)))?;
                AtomPrimitive::Element { atomic_number: elem.atomic_number, aromatic: false }
            }
        };
        Ok(prim)
    }

    fn parse_lowercase(&mut self) -> Result<AtomPrimitive> {
        let ch = self.input[self.pos];
        if let Some(next) = self.peek_at(1) {
            let aromatic_two = match (ch, next) {
                (b's', b'e') => Some(34),
                (b'a', b's') => Some(33),
                (b't', b'e') => Some(52),
                _ => None,
            };
            if let Some(atomic_number) = aromatic_two {
                self.pos += 2;
                return Ok(AtomPrimitive::Element { atomic_number, aromatic: true });
            }
        }
        self.advance();
        let prim = match ch {
            b'a' => AtomPrimitive::Aromatic,
            b'b' => AtomPrimitive::Element { atomic_number: 5, aromatic: true },
            b'c' => AtomPrimitive::Element { atomic_number: 6, aromatic: true },
            b'n' => AtomPrimitive::Element { atomic_number: 7, aromatic: true },
            b'o' => AtomPrimitive::Element { atomic_number: 8, aromatic: true },
            b'p' => AtomPrimitive::Element { atomic_number: 15, aromatic: true },
            b's' => AtomPrimitive::Element { atomic_number: 16, aromatic: true },
            b'h' => AtomPrimitive::ImplicitHCount(
                self.parse_optional_number()
                    .map(|n| u8::try_from(n).map_err(|_| self.error("hydrogen count too large")))
                    .transpose()?,
            ),
            b'r' => match self.parse_optional_number() {
                Some(0) => AtomPrimitive::RingCount(0),
                Some(n) => AtomPrimitive::RingSize(u8::try_from(n).map_err(|_| self.error("ring size too large"))?),
                None => AtomPrimitive::InRing,
            },
            b'v' => AtomPrimitive::Valence(self.parse_count(1)?),
            ch => return Err(self.error(format!("unknown primitive '{}'", ch as char))),
        };
        Ok(prim)
    }

    fn parse_charge(&mut self) -> Result<i8> {
        let symbol = self.advance();
        let sign: i8 = if symbol == Some(b'+') { 1 } else { -1 };
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

    fn parse_count(&mut self, default: u8) -> Result<u8> {
        match self.parse_optional_number() {
            Some(n) => u8::try_from(n).map_err(|_| self.error("count too large")),
            None => Ok(default),
        }
    }

    fn parse_number(&mut self) -> Result<u32> {
        self.parse_optional_number().ok_or_else(|| self.error("expected number"))
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

    // Bond expressions use the same operator precedence as atoms.

    fn parse_bond_low_and(&mut self) -> Result<BondExpr> {
        let mut terms = vec![self.parse_bond_or()?];
        while self.peek() == Some(b';') {
            self.advance();
            terms.push(self.parse_bond_or()?);
        }
        Ok(collapse(terms, BondExpr::And))
    }

    fn parse_bond_or(&mut self) -> Result<BondExpr> {
        let mut terms = vec![self.parse_bond_high_and()?];
        while self.peek() == Some(b',') {
            self.advance();
            terms.push(self.parse_bond_high_and()?);
        }
        Ok(collapse(terms, BondExpr::Or))
    }

    fn parse_bond_high_and(&mut self) -> Result<BondExpr> {
        let mut terms = vec![self.parse_bond_not()?];
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.advance();
                    terms.push(self.parse_bond_not()?);
                }
                Some(ch) if is_bond_start(ch) => terms.push(self.parse_bond_not()?),
                _ => break,
            }
        }
        Ok(collapse(terms, BondExpr::And))
    }

    fn parse_bond_not(&mut self) -> Result<BondExpr> {
        if self.peek() == Some(b'!') {
            self.advance();
            return Ok(BondExpr::Not(Box::new(self.parse_bond_not()?)));
        }
        let expr = match self.peek() {
            Some(b'-' | b'/' | b'\\') => BondExpr::Single,
            Some(b'=') => BondExpr::Double,
            Some(b'#') => BondExpr::Triple,
            Some(b':') => BondExpr::Aromatic,
            Some(b'~') => BondExpr::Any,
            Some(b'@') => BondExpr::Ring,
            _ => return Err(self.error("expected bond primitive")),
        };
        self.advance();
        Ok(expr)
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
            let expr = self
                .pending_bond
                .take()
                .or(open_bond)
                .unwrap_or(BondExpr::SingleOrAromatic);
            self.bonds.push(SmartsBond { atom1: open_atom, atom2: current, expr });
        } else {
            self.ring_closures.insert(ring_num, (current, self.pending_bond.take()));
        }
        Ok(())
    }
}

fn collapse<T>(mut terms: Vec<T>, join: fn(Vec<T>) -> T) -> T {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        join(terms)
    }
}

fn is_bond_start(ch: u8) -> bool {
    matches!(ch, b'-' | b'=' | b'#' | b':' | b'~' | b'@' | b'/' | b'\\' | b'!')
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a SMARTS string into a `SmartsPattern`.
pub fn parse_smarts(smarts: &str) -> Result<SmartsPattern> {
    if smarts.is_empty() {
        return Err(MolprintError::Parse("empty SMARTS string".into()));
    }
    let mut parser = SmartsParser::new(smarts);
    parser.parse()?;
    Ok(SmartsPattern::new(parser.atoms, parser.bonds))
}

/// Check if any substructure of `target` matches `pattern`.
pub fn smarts_match(target: &Molecule, pattern: &SmartsPattern) -> bool {
    let rings = RingInfo::new(target);
    SmartsMatcher::new(target, &rings).has_match(pattern)
}

/// Recursive SMARTS results keyed by (pattern address, atom index). Lives for
/// one top-level query so addresses cannot be reused.
type RecursionCache = HashMap<(usize, usize), bool>;

/// Substructure matcher bound to one molecule and its ring perception.
pub struct SmartsMatcher<'a> {
    mol: &'a Molecule,
    rings: &'a RingInfo,
}

impl<'a> SmartsMatcher<'a> {
    pub fn new(mol: &'a Molecule, rings: &'a RingInfo) -> Self {
        SmartsMatcher { mol, rings }
    }

    /// Whether `pattern` occurs anywhere in the molecule.
    pub fn has_match(&self, pattern: &SmartsPattern) -> bool {
        let mut cache = RecursionCache::new();
        let mut found = false;
        self.search(pattern, None, &mut cache, &mut |_| {
            found = true;
            true
        });
        found
    }

    /// Every mapping of pattern atoms onto molecule atoms, indexed by pattern
    /// atom.
    pub fn find_all(&self, pattern: &SmartsPattern) -> Vec<Vec<usize>> {
        let mut cache = RecursionCache::new();
        let mut matches = Vec::new();
        self.search(pattern, None, &mut cache, &mut |mapping| {
            matches.push(mapping.to_vec());
            false
        });
        matches
    }

    /// Number of matches with distinct atom sets. Counting stops once it
    /// exceeds `limit`.
    pub fn unique_match_count(&self, pattern: &SmartsPattern, limit: usize) -> usize {
        let mut cache = RecursionCache::new();
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        self.search(pattern, None, &mut cache, &mut |mapping| {
            let mut atoms = mapping.to_vec();
            atoms.sort_unstable();
            seen.insert(atoms);
            seen.len() > limit
        });
        seen.len()
    }

    /// Whether some match of `pattern` maps its first atom onto `atom_idx`.
    pub fn atom_matches(&self, pattern: &SmartsPattern, atom_idx: usize) -> bool {
        let mut cache = RecursionCache::new();
        self.anchored_match(pattern, atom_idx, &mut cache)
    }

    fn anchored_match(&self, pattern: &SmartsPattern, atom_idx: usize, cache: &mut RecursionCache) -> bool {
        let mut found = false;
        self.search(pattern, Some(atom_idx), cache, &mut |_| {
            found = true;
            true
        });
        found
    }

    /// Enumerate matches, calling `on_match` for each until it returns true.
    fn search(
        &self,
        pattern: &SmartsPattern,
        pinned: Option<usize>,
        cache: &mut RecursionCache,
        on_match: &mut dyn FnMut(&[usize]) -> bool,
    ) {
        if pattern.atoms.is_empty() || pattern.atoms.len() > self.mol.atom_count() {
            return;
        }
        let mut mapping = vec![usize::MAX; pattern.atoms.len()];
        let mut used = vec![false; self.mol.atom_count()];
        self.extend(pattern, pinned, 0, &mut mapping, &mut used, cache, on_match);
    }

    #[allow(clippy::too_many_arguments)]
    fn extend(
        &self,
        pattern: &SmartsPattern,
        pinned: Option<usize>,
        depth: usize,
        mapping: &mut [usize],
        used: &mut [bool],
        cache: &mut RecursionCache,
        on_match: &mut dyn FnMut(&[usize]) -> bool,
    ) -> bool {
        if depth == pattern.order.len() {
            return on_match(mapping);
        }

        let p = pattern.order[depth];
        let candidates: Vec<usize> = match (pattern.anchor[p], pinned) {
            (Some(q), _) => self.mol.neighbors(mapping[q]),
            (None, Some(atom)) if p == 0 => vec![atom],
            (None, _) => (0..self.mol.atom_count()).collect(),
        };

        for t in candidates {
            if used[t] || !self.feasible(pattern, p, t, mapping, cache) {
                continue;
            }
            mapping[p] = t;
            used[t] = true;
            let stop = self.extend(pattern, pinned, depth + 1, mapping, used, cache, on_match);
            mapping[p] = usize::MAX;
            used[t] = false;
            if stop {
                return true;
            }
        }
        false
    }

    fn feasible(
        &self,
        pattern: &SmartsPattern,
        p: usize,
        t: usize,
        mapping: &[usize],
        cache: &mut RecursionCache,
    ) -> bool {
        for &(p_neighbor, p_bond) in &pattern.adjacency[p] {
            let mapped = mapping[p_neighbor];
            if mapped == usize::MAX {
                continue;
            }
            match self.mol.bond_between(t, mapped) {
                Some(bi) if self.eval_bond(&pattern.bonds[p_bond].expr, bi) => {}
                _ => return false,
            }
        }
        self.eval_atom(&pattern.atoms[p], t, cache)
    }

    fn eval_atom(&self, expr: &AtomExpr, atom_idx: usize, cache: &mut RecursionCache) -> bool {
        match expr {
            AtomExpr::Prim(prim) => self.eval_primitive(prim, atom_idx),
            AtomExpr::Not(inner) => !self.eval_atom(inner, atom_idx, cache),
            AtomExpr::And(terms) => terms.iter().all(|t| self.eval_atom(t, atom_idx, cache)),
            AtomExpr::Or(terms) => terms.iter().any(|t| self.eval_atom(t, atom_idx, cache)),
            AtomExpr::Recursive(sub) => {
                let key = (&**sub as *const SmartsPattern as usize, atom_idx);
                if let Some(&hit) = cache.get(&key) {
                    return hit;
                }
                let hit = self.anchored_match(sub, atom_idx, cache);
                cache.insert(key, hit);
                hit
            }
        }
    }

    fn eval_primitive(&self, prim: &AtomPrimitive, atom_idx: usize) -> bool {
        let mol = self.mol;
        let atom = &mol.atoms[atom_idx];
        match *prim {
            AtomPrimitive::Wildcard => true,
            AtomPrimitive::AtomicNum(n) => atom.atomic_number == n,
            AtomPrimitive::Element { atomic_number, aromatic } => {
                atom.atomic_number == atomic_number && atom.is_aromatic == aromatic
            }
            AtomPrimitive::Aromatic => atom.is_aromatic,
            AtomPrimitive::Aliphatic => !atom.is_aromatic,
            AtomPrimitive::Isotope(m) => atom.isotope == Some(m),
            AtomPrimitive::Degree(d) => mol.degree(atom_idx) == d as usize,
            AtomPrimitive::TotalHCount(h) => mol.total_hydrogens(atom_idx) == h as usize,
            AtomPrimitive::ImplicitHCount(Some(h)) => atom.implicit_hydrogens == h,
            AtomPrimitive::ImplicitHCount(None) => atom.implicit_hydrogens > 0,
            AtomPrimitive::InRing => self.rings.atom_in_ring[atom_idx],
            AtomPrimitive::RingCount(0) => !self.rings.atom_in_ring[atom_idx],
            AtomPrimitive::RingCount(n) => self.rings.atom_ring_count[atom_idx] == n,
            AtomPrimitive::RingSize(s) => self.rings.atom_ring_sizes[atom_idx].contains(&s),
            AtomPrimitive::Connectivity(x) => {
                mol.degree(atom_idx) + atom.implicit_hydrogens as usize == x as usize
            }
            AtomPrimitive::Valence(v) => mol.total_valence(atom_idx) == v as usize,
            AtomPrimitive::Charge(c) => atom.formal_charge == c,
        }
    }

    fn eval_bond(&self, expr: &BondExpr, bond_idx: usize) -> bool {
        let order = self.mol.bonds[bond_idx].order;
        match expr {
            BondExpr::Single => order == BondOrder::Single,
            BondExpr::Double => order == BondOrder::Double,
            BondExpr::Triple => order == BondOrder::Triple,
            BondExpr::Aromatic => order == BondOrder::Aromatic,
            BondExpr::SingleOrAromatic => matches!(order, BondOrder::Single | BondOrder::Aromatic),
            BondExpr::Ring => self.rings.bond_in_ring[bond_idx],
            BondExpr::Any => true,
            BondExpr::Not(inner) => !self.eval_bond(inner, bond_idx),
            BondExpr::And(terms) => terms.iter().all(|t| self.eval_bond(t, bond_idx)),
            BondExpr::Or(terms) => terms.iter().any(|t| self.eval_bond(t, bond_idx)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn count(smarts: &str, smiles: &str) -> usize {
        let pattern = parse_smarts(smarts).unwrap();
        let mol = parse_smiles(smiles).unwrap();
        let rings = RingInfo::new(&mol);
        SmartsMatcher::new(&mol, &rings).unique_match_count(&pattern, usize::MAX - 1)
    }

    fn matches(smarts: &str, smiles: &str) -> bool {
        let pattern = parse_smarts(smarts).unwrap();
        let mol = parse_smiles(smiles).unwrap();
        smarts_match(&mol, &pattern)
    }

    #[test]
    fn atomic_num_matches_carbon() {
        assert!(matches("[#6]", "C"));
        assert!(!matches("[#6]", "N"));
        assert!(matches("[!#6]", "N"));
        assert!(!matches("[!#6]", "C"));
    }

    #[test]
    fn aromatic_and_aliphatic_elements() {
        assert!(matches("c", "c1ccccc1"));
        assert!(!matches("C", "c1ccccc1"));
        assert!(matches("[a]", "c1ccccc1"));
        assert!(!matches("[a]", "CC"));
        assert!(matches("[A]", "CC"));
        assert!(matches("[c,n]", "c1ccncc1"));
        assert!(matches("[se]", "c1cc[se]c1"));
    }

    #[test]
    fn two_letter_elements() {
        assert!(matches("[Cl]", "CCl"));
        assert!(matches("Cl", "CCl"));
        assert!(matches("[Br]", "CBr"));
        assert!(!matches("[Cl]", "CC"));
        assert!(matches("[Na]", "[Na+].[Cl-]"));
        assert!(matches("[Cs+]", "[Cs+].[Cl-]"));
        assert!(matches("[Sc]", "[Sc]"));
        // N and H followed by an h or s primitive
        assert!(matches("[Nh]", "CN"));
        assert!(!matches("[Nh]", "CN(C)C"));
        assert!(matches("[Nh1]", "CNC"));
    }

    #[test]
    fn hydrogen_primitives() {
        assert!(matches("[CH3]", "CC"));
        assert!(!matches("[CH4]", "CC"));
        assert!(matches("[OH]", "CCO"));
        assert!(matches("[!H0]", "CO"));
        assert!(matches("[H]", "[H][H]"));
        assert!(matches("[#7;!H0]", "CN"));
        assert!(!matches("[#7;!H0]", "CN(C)C"));
        assert!(matches("[Ch3]", "CC"));
    }

    #[test]
    fn degree_connectivity_valence() {
        assert!(matches("[D3]", "CC(C)C"));
        assert!(!matches("[D4]", "CC(C)C"));
        assert!(matches("[X4]", "CC"));
        assert!(matches("[v4]", "C=C"));
        assert!(matches("[N;v3]", "CN"));
        assert!(matches("[S;v6]", "CS(=O)(=O)O"));
    }

    #[test]
    fn charge_primitives() {
        assert!(matches("[+]", "[NH4+]"));
        assert!(matches("[N+1]", "[NH4+]"));
        assert!(matches("[O-]", "C[O-]"));
        assert!(matches("[#8;+0]", "CO"));
        assert!(!matches("[#8;+0]", "C[O-]"));
        assert!(matches("[Fe++]", "[Fe+2]"));
    }

    #[test]
    fn ring_primitives() {
        assert!(matches("[R]", "c1ccccc1"));
        assert!(!matches("[R]", "CC"));
        assert!(matches("[R0]", "Cc1ccccc1"));
        assert!(matches("[r6]", "c1ccccc1"));
        assert!(!matches("[r6]", "C1CCCC1"));
        assert!(matches("[R2]", "c1ccc2ccccc2c1"));
        assert!(!matches("[R2]", "c1ccccc1"));
    }

    #[test]
    fn isotope_primitive() {
        assert!(matches("[13C]", "[13CH4]"));
        assert!(!matches("[13C]", "C"));
    }

    #[test]
    fn bond_primitives() {
        assert!(matches("C=O", "CC=O"));
        assert!(!matches("C=O", "CCO"));
        assert!(matches("C#N", "CC#N"));
        assert!(matches("C~O", "CCO"));
        assert!(matches("c:c", "c1ccccc1"));
        assert!(!matches("c-c", "c1ccccc1"));
        assert!(matches("c-c", "c1ccccc1-c1ccccc1"));
        assert!(matches("*@*", "C1CC1"));
        assert!(!matches("*@*", "CC"));
        assert!(matches("C!@C", "CC1CC1"));
        assert!(!matches("C!@C", "C1CC1"));
        assert!(matches("[#6]-,=[#8]", "C=O"));
    }

    #[test]
    fn unspecified_bond_is_single_or_aromatic() {
        assert!(matches("cc", "c1ccccc1"));
        assert!(matches("CC", "CC"));
        assert!(!matches("CC", "C=C"));
    }

    #[test]
    fn operator_precedence() {
        // ',' binds tighter than ';'
        assert!(matches("[C,N;H1]", "CNC"));
        assert!(!matches("[C,N;H1]", "CN(C)C"));
        // '&' binds tighter than ','
        assert!(matches("[N&H2,O]", "CO"));
        assert!(!matches("[N&H2,O]", "CN(C)C"));
    }

    #[test]
    fn recursive_smarts() {
        assert!(matches("[$([OH])]", "Oc1ccccc1"));
        assert!(matches("[$([CX3]=O)]", "CC=O"));
        assert!(!matches("[$([CX3]=O)]", "CCO"));
        // recursion inside an OR list
        let acid = "[$([C,S](=[O,S,P])-[O;H1,-1])]";
        assert!(matches(acid, "CC(=O)O"));
        assert!(matches(acid, "CC(=O)[O-]"));
        assert!(!matches(acid, "CC(=O)OC"));
        assert!(matches("[N,$(O=*)]", "CC=O"));
    }

    #[test]
    fn ring_closure_in_pattern() {
        assert!(matches("c1ccccc1", "Cc1ccccc1"));
        assert!(!matches("c1ccccc1", "C1CCCCC1"));
        assert!(matches("*1**1", "C1CC1"));
        assert!(!matches("*1**1", "C1CCC1"));
    }

    #[test]
    fn unique_counts_collapse_symmetric_matches() {
        assert_eq!(count("c1ccccc1", "c1ccccc1"), 1);
        assert_eq!(count("[#6]", "CCO"), 2);
        assert_eq!(count("C~C", "CCC"), 2);
        assert_eq!(count("[OH]", "OCCO"), 2);
    }

    #[test]
    fn unique_count_stops_past_limit() {
        let pattern = parse_smarts("[#6]").unwrap();
        let mol = parse_smiles("CCCCCCCC").unwrap();
        let rings = RingInfo::new(&mol);
        let matcher = SmartsMatcher::new(&mol, &rings);
        assert_eq!(matcher.unique_match_count(&pattern, 2), 3);
    }

    #[test]
    fn find_all_returns_mappings() {
        let pattern = parse_smarts("[#6][#8]").unwrap();
        let mol = parse_smiles("CCO").unwrap();
        let rings = RingInfo::new(&mol);
        let all = SmartsMatcher::new(&mol, &rings).find_all(&pattern);
        assert_eq!(all, vec![vec![1, 2]]);
    }

    #[test]
    fn atom_matches_pins_first_atom() {
        let pattern = parse_smarts("[OH]C").unwrap();
        let mol = parse_smiles("OCC").unwrap();
        let rings = RingInfo::new(&mol);
        let matcher = SmartsMatcher::new(&mol, &rings);
        assert!(matcher.atom_matches(&pattern, 0));
        assert!(!matcher.atom_matches(&pattern, 1));
    }

    #[test]
    fn disconnected_pattern() {
        assert!(matches("O.O", "OCCO"));
        assert!(!matches("O.O", "CCO"));
    }

    #[test]
    fn invalid_smarts_error() {
        assert!(parse_smarts("").is_err());
        assert!(parse_smarts("[").is_err());
        assert!(parse_smarts("[C").is_err());
        assert!(parse_smarts("C1CC").is_err());
        assert!(parse_smarts("C(").is_err());
        assert!(parse_smarts("[$(C]").is_err());
        assert!(parse_smarts("C=").is_err());
        assert!(parse_smarts("[Q]").is_err());
    }
}
