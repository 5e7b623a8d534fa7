use criterion::{black_box, criterion_group, criterion_main, Criterion};
use molprint_chem::{
    compute_fingerprints, fingerprint_library, maccs_fingerprint, morgan_fingerprint, parse_smiles, path_fingerprint,
    score_library, FingerprintConfig, Profile,
};

/// A set of representative drug-like SMILES strings
const SMILES_SET: &[&str] = &[
    "CCO",                                 // ethanol
    "CC(=O)O",                             // acetic acid
    "c1ccccc1",                            // benzene
    "CC(=O)Oc1ccccc1C(=O)O",               // aspirin
    "CC12CCC3C(C1CCC2O)CCC4=CC(=O)CCC34C", // testosterone
    "CN1C=NC2=C1C(=O)N(C(=O)N2C)C",        // caffeine
    "CC(C)CC1=CC=C(C=C1)C(C)C(=O)O",       // ibuprofen
    "CC(=O)Nc1ccc(O)cc1",                  // acetaminophen
    "c1ccc2ccccc2c1",                      // naphthalene
    "c1cc[nH]c1",                          // pyrrole
    "C1=CSC=C1",                           // thiophene
    "CN1CCC[C@H]1c2cccnc2",                // nicotine
];

fn bench_smiles_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("smiles_parse");

    let smiles_1k: Vec<&str> = SMILES_SET.iter().copied().cycle().take(1000).collect();

    group.bench_function("1k_mols", |b| {
        b.iter(|| {
            for &smi in black_box(&smiles_1k) {
                let _ = parse_smiles(smi);
            }
        })
    });

    group.finish();
}

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");

    let mols: Vec<_> = SMILES_SET.iter().filter_map(|s| parse_smiles(s).ok()).collect();
    let config = FingerprintConfig::default();

    group.bench_function("ecfp6_1024", |b| {
        b.iter(|| {
            for mol in black_box(&mols) {
                let _ = morgan_fingerprint(mol, 3, 1024);
            }
        })
    });

    group.bench_function("maccs", |b| {
        b.iter(|| {
            for mol in black_box(&mols) {
                let _ = maccs_fingerprint(mol);
            }
        })
    });

    group.bench_function("rdk7", |b| {
        b.iter(|| {
            for mol in black_box(&mols) {
                let _ = path_fingerprint(mol, 7, &config);
            }
        })
    });

    group.bench_function("full_profile", |b| {
        b.iter(|| {
            for mol in black_box(&mols) {
                let _ = compute_fingerprints(mol, Profile::Full.specs(), &config);
            }
        })
    });

    group.finish();
}

fn bench_score_library(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_library");

    let smiles: Vec<String> = SMILES_SET.iter().map(|s| s.to_string()).collect();
    let queries = fingerprint_library(&smiles[..4]);
    let targets = fingerprint_library(&smiles);

    group.bench_function("4x12_top100", |b| {
        b.iter(|| score_library(black_box(&queries), black_box(&targets), 100))
    });

    group.finish();
}

criterion_group!(benches, bench_smiles_parse, bench_generators, bench_score_library);
criterion_main!(benches);
