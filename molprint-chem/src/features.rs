//! Pharmacophoric atom features used as FCFP invariants.

use once_cell::sync::Lazy;

use crate::molecule::Molecule;
use crate::ring::RingInfo;
use crate::smarts::{parse_smarts, SmartsMatcher, SmartsPattern};

/// Pharmacophore feature classes, in invariant bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feature {
    Donor,
    Acceptor,
    Aromatic,
    Halogen,
    Basic,
    Acidic,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Donor,
        Feature::Acceptor,
        Feature::Aromatic,
        Feature::Halogen,
        Feature::Basic,
        Feature::Acidic,
    ];

    /// Bit set in the invariant when an atom has this feature.
    pub fn mask(self) -> u32 {
        1 << self as u32
    }

    /// SMARTS definition of the feature.
    pub fn smarts(self) -> &'static str {
        match self {
            Feature::Donor => "[$([N;!H0;v3,v4&+1]),$([O,S;H1;+0]),n&H1&+0]",
            Feature::Acceptor => concat!(
                "[$([O,S;H1;v2;!$(*-*=[O,N,P,S])]),$([O,S;H0;v2]),$([O,S;-]),",
                "$([N;v3;!$(N-*=[O,N,P,S])]),n&H0&+0,",
                "$([o,s;+0;!$([o,s]:n);!$([o,s]:c:n)])]"
            ),
            Feature::Aromatic => "[a]",
            Feature::Halogen => "[F,Cl,Br,I]",
            Feature::Basic => concat!(
                "[#7;+,$([N;H2&+0][$([C,a]);!$([C,a](=O))]),",
                "$([N;H1&+0]([$([C,a]);!$([C,a](=O))])[$([C,a]);!$([C,a](=O))]),",
                "$([N;H0&+0]([C;!$(C(=O))])([C;!$(C(=O))])[C;!$(C(=O))])]"
            ),
            Feature::Acidic => "[$([C,S](=[O,S,P])-[O;H1,-1])]",
        }
    }
}

static FEATURE_PATTERNS: Lazy<Vec<(Feature, SmartsPattern)>> = Lazy::new(|| {
    Feature::ALL
        .iter()
        .map(|&f| (f, parse_smarts(f.smarts()).expect("feature SMARTS is valid")))
        .collect()
});

/// Per-atom feature bit masks (see [`Feature::mask`]).
pub fn feature_invariants(mol: &Molecule, rings: &RingInfo) -> Vec<u32> {
    let matcher = SmartsMatcher::new(mol, rings);
    let mut invariants = vec![0u32; mol.atom_count()];
    for (feature, pattern) in FEATURE_PATTERNS.iter() {
        for mapping in matcher.find_all(pattern) {
            for atom in mapping {
                invariants[atom] |= feature.mask();
            }
        }
    }
    invariants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn invariants(smiles: &str) -> Vec<u32> {
        let mol = parse_smiles(smiles).unwrap();
        let rings = RingInfo::new(&mol);
        feature_invariants(&mol, &rings)
    }

    #[test]
    fn all_patterns_parse() {
        assert_eq!(FEATURE_PATTERNS.len(), Feature::ALL.len());
    }

    #[test]
    fn masks_are_distinct_bits() {
        let combined = Feature::ALL.iter().fold(0, |acc, f| acc | f.mask());
        assert_eq!(combined, 0b11_1111);
    }

    #[test]
    fn alcohol_is_donor_and_acceptor() {
        let inv = invariants("CCO");
        assert_eq!(inv[0], 0);
        assert_eq!(inv[2], Feature::Donor.mask() | Feature::Acceptor.mask());
    }

    #[test]
    fn carboxylic_acid_carbon_is_acidic() {
        let inv = invariants("CC(=O)O");
        assert_ne!(inv[1] & Feature::Acidic.mask(), 0);
        assert_ne!(inv[2] & Feature::Acceptor.mask(), 0);
    }

    #[test]
    fn aromatic_and_halogen() {
        let inv = invariants("Clc1ccccc1");
        assert_eq!(inv[0], Feature::Halogen.mask());
        assert_eq!(inv[1], Feature::Aromatic.mask());
    }

    #[test]
    fn amines_are_basic_amides_are_not() {
        let amine = invariants("CCN");
        assert_ne!(amine[2] & Feature::Basic.mask(), 0);
        assert_ne!(amine[2] & Feature::Donor.mask(), 0);
        let amide = invariants("CC(=O)N");
        assert_eq!(amide[3] & Feature::Basic.mask(), 0);
        assert_ne!(amide[3] & Feature::Donor.mask(), 0);
    }

    #[test]
    fn pyrrole_donor_pyridine_acceptor() {
        let pyrrole = invariants("c1cc[nH]c1");
        assert_ne!(pyrrole[3] & Feature::Donor.mask(), 0);
        let pyridine = invariants("c1ccncc1");
        assert_ne!(pyridine[3] & Feature::Acceptor.mask(), 0);
        assert_eq!(pyridine[3] & Feature::Donor.mask(), 0);
    }
}
