//! MACCS 166-key structural fingerprints.
//!
//! MACCS (Molecular ACCess System) keys are one of the most widely used
//! structural fingerprint types. Each key is a SMARTS pattern with a match
//! count threshold: the key is set when the number of matches with distinct
//! atom sets exceeds the threshold. Bit positions equal key numbers, so the
//! vector is 167 bits wide and bit 0 is never set.

use once_cell::sync::Lazy;

use crate::fingerprint::Fingerprint;
use crate::molecule::Molecule;
use crate::ring::RingInfo;
use crate::smarts::{parse_smarts, SmartsMatcher, SmartsPattern};

/// Width of a MACCS fingerprint.
pub const MACCS_BITS: usize = 167;

/// More than one aromatic ring; evaluated from ring perception.
const KEY_AROMATIC_RINGS: usize = 125;
/// More than one fragment; evaluated from connectivity.
const KEY_FRAGMENTS: usize = 166;

// Keys 1 (isotope) and 44 (other) have no definition.
const MACCS_KEYS: &[(usize, &str, usize)] = &[
    (2, "[#104]", 0),
    (3, "[#32,#33,#34,#50,#51,#52,#82,#83,#84]", 0),
    (4, "[Ac,Th,Pa,U,Np,Pu,Am,Cm,Bk,Cf,Es,Fm,Md,No,Lr]", 0),
    (5, "[Sc,Ti,Y,Zr,Hf]", 0),
    (6, "[La,Ce,Pr,Nd,Pm,Sm,Eu,Gd,Tb,Dy,Ho,Er,Tm,Yb,Lu]", 0),
    (7, "[V,Cr,Mn,Nb,Mo,Tc,Ta,W,Re]", 0),
    (8, "[!#6;!#1]1~*~*~*~1", 0),
    (9, "[Fe,Co,Ni,Ru,Rh,Pd,Os,Ir,Pt]", 0),
    (10, "[Be,Mg,Ca,Sr,Ba,Ra]", 0),
    (11, "*1~*~*~*~1", 0),
    (12, "[Cu,Zn,Ag,Cd,Au,Hg]", 0),
    (13, "[#8]~[#7](~[#6])~[#6]", 0),
    (14, "[#16]-[#16]", 0),
    (15, "[#8]~[#6](~[#8])~[#8]", 0),
    (16, "[!#6;!#1]1~*~*~1", 0),
    (17, "[#6]#[#6]", 0),
    (18, "[#5,#13,#31,#49,#81]", 0),
    (19, "*1~*~*~*~*~*~*~1", 0),
    (20, "[#14]", 0),
    (21, "[#6]=[#6](~[!#6;!#1])~[!#6;!#1]", 0),
    (22, "*1~*~*~1", 0),
    (23, "[#7]~[#6](~[#8])~[#8]", 0),
    (24, "[#7]-[#8]", 0),
    (25, "[#7]~[#6](~[#7])~[#7]", 0),
    (26, "[#6]=;@[#6](@*)@*", 0),
    (27, "[I]", 0),
    (28, "[!#6;!#1]~[CH2]~[!#6;!#1]", 0),
    (29, "[#15]", 0),
    (30, "[#6]~[!#6;!#1](~[#6])(~[#6])~*", 0),
    (31, "[!#6;!#1]~[F,Cl,Br,I]", 0),
    (32, "[#6]~[#16]~[#7]", 0),
    (33, "[#7]~[#16]", 0),
    (34, "[CH2]=*", 0),
    (35, "[Li,Na,K,Rb,Cs,Fr]", 0),
    (36, "[#16R]", 0),
    (37, "[#7]~[#6](~[#8])~[#7]", 0),
    (38, "[#7]~[#6](~[#6])~[#7]", 0),
    (39, "[#8]~[#16](~[#8])~[#8]", 0),
    (40, "[#16]-[#8]", 0),
    (41, "[#6]#[#7]", 0),
    (42, "F", 0),
    (43, "[!#6;!#1;!H0]~*~[!#6;!#1;!H0]", 0),
    (45, "[#6]=[#6]~[#7]", 0),
    (46, "Br", 0),
    (47, "[#16]~*~[#7]", 0),
    (48, "[#8]~[!#6;!#1](~[#8])(~[#8])", 0),
    (49, "[!+0]", 0),
    (50, "[#6]=[#6](~[#6])~[#6]", 0),
    (51, "[#6]~[#16]~[#8]", 0),
    (52, "[#7]~[#7]", 0),
    (53, "[!#6;!#1;!H0]~*~*~*~[!#6;!#1;!H0]", 0),
    (54, "[!#6;!#1;!H0]~*~*~[!#6;!#1;!H0]", 0),
    (55, "[#8]~[#16]~[#8]", 0),
    (56, "[#8]~[#7](~[#8])~[#6]", 0),
    (57, "[#8R]", 0),
    (58, "[!#6;!#1]~[#16]~[!#6;!#1]", 0),
    (59, "[#16]!:*:*", 0),
    (60, "[#16]=[#8]", 0),
    (61, "*~[#16](~*)~*", 0),
    (62, "*@*!@*@*", 0),
    (63, "[#7]=[#8]", 0),
    (64, "*@*!@[#16]", 0),
    (65, "c:n", 0),
    (66, "[#6]~[#6](~[#6])(~[#6])~*", 0),
    (67, "[!#6;!#1]~[#16]", 0),
    (68, "[!#6;!#1;!H0]~[!#6;!#1;!H0]", 0),
    (69, "[!#6;!#1]~[!#6;!#1;!H0]", 0),
    (70, "[!#6;!#1]~[#7]~[!#6;!#1]", 0),
    (71, "[#7]~[#8]", 0),
    (72, "[#8]~*~*~[#8]", 0),
    (73, "[#16]=*", 0),
    (74, "[CH3]~*~[CH3]", 0),
    (75, "*!@[#7]@*", 0),
    (76, "[#6]=[#6](~*)~*", 0),
    (77, "[#7]~*~[#7]", 0),
    (78, "[#6]=[#7]", 0),
    (79, "[#7]~*~*~[#7]", 0),
    (80, "[#7]~*~*~*~[#7]", 0),
    (81, "[#16]~*(~*)~*", 0),
    (82, "*~[CH2]~[!#6;!#1;!H0]", 0),
    (83, "[!#6;!#1]1~*~*~*~*~1", 0),
    (84, "[NH2]", 0),
    (85, "[#6]~[#7](~[#6])~[#6]", 0),
    (86, "[C;H2,H3][!#6;!#1][C;H2,H3]", 0),
    (87, "[F,Cl,Br,I]!@*@*", 0),
    (88, "[#16]", 0),
    (89, "[#8]~*~*~*~[#8]", 0),
    (
        90,
        "[$([!#6;!#1;!H0]~*~*~[CH2]~*),$([!#6;!#1;!H0;R]1@[R]@[R]@[CH2;R]1),$([!#6;!#1;!H0]~[R]1@[R]@[CH2;R]1)]",
        0,
    ),
    (
        91,
        "[$([!#6;!#1;!H0]~*~*~*~[CH2]~*),$([!#6;!#1;!H0;R]1@[R]@[R]@[R]@[CH2;R]1),$([!#6;!#1;!H0]~[R]1@[R]@[R]@[CH2;R]1),$([!#6;!#1;!H0]~*~[R]1@[R]@[CH2;R]1)]",
        0,
    ),
    (92, "[#8]~[#6](~[#7])~[#6]", 0),
    (93, "[!#6;!#1]~[CH3]", 0),
    (94, "[!#6;!#1]~[#7]", 0),
    (95, "[#7]~*~*~[#8]", 0),
    (96, "*1~*~*~*~*~1", 0),
    (97, "[#7]~*~*~*~[#8]", 0),
    (98, "[!#6;!#1]1~*~*~*~*~*~1", 0),
    (99, "[#6]=[#6]", 0),
    (100, "*~[CH2]~[#7]", 0),
    (
        101,
        concat!(
            "[$([R]@1@[R]@[R]@[R]@[R]@[R]@[R]@[R]1),",
            "$([R]@1@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]1),",
            "$([R]@1@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]1),",
            "$([R]@1@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]1),",
            "$([R]@1@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]1),",
            "$([R]@1@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]1),",
            "$([R]@1@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]@[R]1)]"
        ),
        0,
    ),
    (102, "[!#6;!#1]~[#8]", 0),
    (103, "Cl", 0),
    (104, "[!#6;!#1;!H0]~*~[CH2]~*", 0),
    (105, "*@*(@*)@*", 0),
    (106, "[!#6;!#1]~*(~[!#6;!#1])~[!#6;!#1]", 0),
    (107, "[F,Cl,Br,I]~*(~*)~*", 0),
    (108, "[CH3]~*~*~*~[CH2]~*", 0),
    (109, "*~[CH2]~[#8]", 0),
    (110, "[#7]~[#6]~[#8]", 0),
    (111, "[#7]~*~[CH2]~*", 0),
    (112, "*~*(~*)(~*)~*", 0),
    (113, "[#8]!:*:*", 0),
    (114, "[CH3]~[CH2]~*", 0),
    (115, "[CH3]~*~[CH2]~*", 0),
    (116, "[$([CH3]~*~*~[CH2]~*),$([CH3]~*1~*~[CH2]1)]", 0),
    (117, "[#7]~*~[#8]", 0),
    (118, "[$(*~[CH2]~[CH2]~*),$(*1~[CH2]~[CH2]1)]", 1),
    (119, "[#7]=*", 0),
    (120, "[!#6;R]", 1),
    (121, "[#7;R]", 0),
    (122, "*~[#7](~*)~*", 0),
    (123, "[#8]~[#6]~[#8]", 0),
    (124, "[!#6;!#1]~[!#6;!#1]", 0),
    (126, "*!@[#8]!@*", 0),
    (127, "*@*!@[#8]", 1),
    (
        128,
        "[$(*~[CH2]~*~*~*~[CH2]~*),$([R]1@[CH2;R]@[R]@[R]@[R]@[CH2;R]1),$(*~[CH2]~[R]1@[R]@[R]@[CH2;R]1),$(*~[CH2]~*~[R]1@[R]@[CH2;R]1)]",
        0,
    ),
    (
        129,
        "[$(*~[CH2]~*~*~[CH2]~*),$([R]1@[CH2]@[R]@[R]@[CH2;R]1),$(*~[CH2]~[R]1@[R]@[CH2;R]1)]",
        0,
    ),
    (130, "[!#6;!#1]~[!#6;!#1]", 1),
    (131, "[!#6;!#1;!H0]", 1),
    (132, "[#8]~*~[CH2]~*", 0),
    (133, "*@*!@[#7]", 0),
    (134, "[F,Cl,Br,I]", 0),
    (135, "[#7]!:*:*", 0),
    (136, "[#8]=*", 1),
    (137, "[!C;!c;R]", 0),
    (138, "[!#6;!#1]~[CH2]~*", 1),
    (139, "[O;!H0]", 0),
    (140, "[#8]", 3),
    (141, "[CH3]", 2),
    (142, "[#7]", 1),
    (143, "*@*!@[#8]", 0),
    (144, "*!:*:*!:*", 0),
    (145, "*1~*~*~*~*~*~1", 1),
    (146, "[#8]", 2),
    (147, "[$(*~[CH2]~[CH2]~*),$([R]1@[CH2;R]@[CH2;R]1)]", 0),
    (148, "*~[!#6;!#1](~*)~*", 0),
    (149, "[C;H3,H4]", 1),
    (150, "*!@*@*!@*", 0),
    (151, "[#7;!H0]", 0),
    (152, "[#8]~[#6](~[#6])~[#6]", 0),
    (153, "[!#6;!#1]~[CH2]~*", 0),
    (154, "[#6]=[#8]", 0),
    (155, "*!@[CH2]!@*", 0),
    (156, "[#7]~*(~*)~*", 0),
    (157, "[#6]-[#8]", 0),
    (158, "[#6]-[#7]", 0),
    (159, "[#8]", 1),
    (160, "[C;H3,H4]", 0),
    (161, "[#7]", 0),
    (162, "a", 0),
    (163, "*1~*~*~*~*~*~1", 0),
    (164, "[#8]", 0),
    (165, "[R]", 0),
];

/// Compiled key patterns: (key, threshold, pattern).
static MACCS_PATTERNS: Lazy<Vec<(usize, usize, SmartsPattern)>> = Lazy::new(|| {
    MACCS_KEYS
        .iter()
        .map(|&(key, smarts, threshold)| {
            (key, threshold, parse_smarts(smarts).expect("MACCS key SMARTS is valid"))
        })
        .collect()
});

/// Compute the 166-key MACCS fingerprint (167 bits, bit `k` = key `k`).
///
/// # Example
///
/// ```
/// use molprint_chem::{parse_smiles, maccs_fingerprint};
///
/// let aspirin = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
/// let fp = maccs_fingerprint(&aspirin);
/// assert_eq!(fp.nbits(), 167);
/// assert!(!fp.get_bit(0));
/// assert!(fp.get_bit(154)); // C=O
/// ```
pub fn maccs_fingerprint(mol: &Molecule) -> Fingerprint {
    let rings = RingInfo::new(mol);
    maccs_with_rings(mol, &rings)
}

pub(crate) fn maccs_with_rings(mol: &Molecule, rings: &RingInfo) -> Fingerprint {
    let mut fp = Fingerprint::new(MACCS_BITS);
    if mol.atom_count() == 0 {
        return fp;
    }

    let matcher = SmartsMatcher::new(mol, rings);
    for (key, threshold, pattern) in MACCS_PATTERNS.iter() {
        let hit = if *threshold == 0 {
            matcher.has_match(pattern)
        } else {
            matcher.unique_match_count(pattern, *threshold) > *threshold
        };
        if hit {
            fp.set_bit(*key);
        }
    }

    if rings.aromatic_ring_count(mol) > 1 {
        fp.set_bit(KEY_AROMATIC_RINGS);
    }
    if mol.fragment_count() > 1 {
        fp.set_bit(KEY_FRAGMENTS);
    }

    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::tanimoto_similarity;
    use crate::smiles::parse_smiles;

    fn keys(smiles: &str) -> Vec<usize> {
        maccs_fingerprint(&parse_smiles(smiles).unwrap()).on_bits()
    }

    #[test]
    fn all_key_patterns_parse() {
        assert_eq!(MACCS_PATTERNS.len(), 162);
        assert!(MACCS_PATTERNS.iter().all(|(k, _, _)| *k >= 2 && *k <= 165));
    }

    #[test]
    fn benzene_aromatic_ring_keys() {
        let on = keys("c1ccccc1");
        assert!(on.contains(&162)); // aromatic
        assert!(on.contains(&163)); // 6-membered ring
        assert!(on.contains(&165)); // ring
        assert!(!on.contains(&KEY_AROMATIC_RINGS));
        assert!(!on.contains(&145)); // only one 6-ring
    }

    #[test]
    fn naphthalene_has_two_aromatic_rings() {
        let on = keys("c1ccc2ccccc2c1");
        assert!(on.contains(&KEY_AROMATIC_RINGS));
        assert!(on.contains(&145));
    }

    #[test]
    fn ethanol_oxygen_and_hydroxyl() {
        let on = keys("CCO");
        assert!(on.contains(&164)); // O
        assert!(on.contains(&139)); // OH
        assert!(on.contains(&157)); // C-O
        assert!(on.contains(&160)); // CH3
        assert!(!on.contains(&159)); // only one O
        assert!(!on.contains(&165));
    }

    #[test]
    fn chlorobenzene_halogen_and_aromatic() {
        let on = keys("Clc1ccccc1");
        assert!(on.contains(&103)); // Cl
        assert!(on.contains(&134)); // halogen
        assert!(on.contains(&162));
        assert!(!on.contains(&42)); // no F
    }

    #[test]
    fn count_thresholds() {
        // three oxygens: > 1 and > 2 but not > 3
        let on = keys("OCC(O)CO");
        assert!(on.contains(&159));
        assert!(on.contains(&146));
        assert!(!on.contains(&140));
        let four = keys("OCC(O)C(O)CO");
        assert!(four.contains(&140));
    }

    #[test]
    fn fragments_key() {
        assert!(keys("[Na+].[Cl-]").contains(&KEY_FRAGMENTS));
        assert!(keys("[Na+].[Cl-]").contains(&35));
        assert!(!keys("CCO").contains(&KEY_FRAGMENTS));
    }

    #[test]
    fn undefined_keys_never_set() {
        let on = keys("[13CH3]C(=O)Oc1ccccc1C(=O)O.[Na+]");
        assert!(!on.contains(&0));
        assert!(!on.contains(&1));
        assert!(!on.contains(&44));
    }

    #[test]
    fn empty_molecule_no_keys() {
        let mol = Molecule::new(String::new(), vec![], vec![]);
        assert_eq!(maccs_fingerprint(&mol).count_ones(), 0);
    }

    #[test]
    fn deterministic_and_similar() {
        let a = maccs_fingerprint(&parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap());
        let b = maccs_fingerprint(&parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap());
        assert_eq!(a, b);
        let c = maccs_fingerprint(&parse_smiles("OC(=O)c1ccccc1O").unwrap());
        let sim = tanimoto_similarity(&a, &c);
        assert!(sim > 0.3 && sim < 1.0, "tanimoto = {sim}");
    }
}
