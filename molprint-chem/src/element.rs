//! Periodic table lookup.

/// A chemical element from the periodic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub atomic_number: u8,
    pub symbol: &'static str,
}

impl Element {
    /// Allowed valences used to assign implicit hydrogens, smallest first.
    ///
    /// Empty for elements that never receive implicit hydrogens.
    pub fn default_valences(&self) -> &'static [u8] {
        match self.atomic_number {
            1 => &[1],
            5 => &[3],
            6 => &[4],
            7 => &[3],
            8 => &[2],
            9 => &[1],
            14 => &[4],
            15 => &[3, 5, 7],
            16 => &[2, 4, 6],
            17 => &[1],
            33 => &[3, 5],
            34 => &[2, 4, 6],
            35 => &[1],
            52 => &[2, 4, 6],
            53 => &[1, 3, 5],
            _ => &[],
        }
    }

    /// Whether the element may be written without brackets in SMILES.
    pub fn is_organic_subset(&self) -> bool {
        matches!(self.atomic_number, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }
}

/// Element symbols indexed by atomic number − 1.
static SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Look up an element by its symbol (e.g. "C", "Fe"). Case-sensitive.
pub fn element_by_symbol(symbol: &str) -> Option<Element> {
    SYMBOLS
        .iter()
        .position(|&s| s == symbol)
        .map(|i| Element { atomic_number: (i + 1) as u8, symbol: SYMBOLS[i] })
}

/// Look up an element by its atomic number (1-based).
pub fn element_by_number(n: u8) -> Option<Element> {
    if (1..=118).contains(&n) {
        Some(Element { atomic_number: n, symbol: SYMBOLS[(n - 1) as usize] })
    } else {
        None
    }
}
