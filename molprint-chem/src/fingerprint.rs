//! Fixed-width fingerprint bit vectors and similarity.

use std::fmt;

use molprint_core::{ContentAddressable, MolprintError, Result};
use sha2::{Digest, Sha256};

/// A fixed-size bit vector fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fingerprint {
    bits: Vec<u64>,
    nbits: usize,
}

impl Fingerprint {
    /// Create an empty fingerprint of `nbits` bits.
    ///
    /// # Panics
    ///
    /// Panics if `nbits` is zero.
    pub fn new(nbits: usize) -> Self {
        assert!(nbits > 0, "fingerprint width must be positive");
        Fingerprint {
            bits: vec![0u64; nbits.div_ceil(64)],
            nbits,
        }
    }

    /// Set a bit; positions wrap modulo the width.
    pub fn set_bit(&mut self, pos: usize) {
        let pos = pos % self.nbits;
        self.bits[pos / 64] |= 1u64 << (pos % 64);
    }

    /// Get a bit; positions wrap modulo the width.
    pub fn get_bit(&self, pos: usize) -> bool {
        let pos = pos % self.nbits;
        (self.bits[pos / 64] >> (pos % 64)) & 1 == 1
    }

    /// Count the number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    /// Number of bits in the fingerprint.
    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// Indices of set bits in ascending order.
    pub fn on_bits(&self) -> Vec<usize> {
        (0..self.nbits).filter(|&i| self.get_bit(i)).collect()
    }

    /// Render as `nbits` ASCII `0`/`1` characters, bit 0 first.
    pub fn to_bit_string(&self) -> String {
        (0..self.nbits)
            .map(|i| if self.get_bit(i) { '1' } else { '0' })
            .collect()
    }

    /// Parse a `0`/`1` string where character `i` is bit `i`.
    pub fn from_bit_string(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(MolprintError::Parse("empty bit string".into()));
        }
        let mut fp = Fingerprint::new(s.len());
        for (i, ch) in s.bytes().enumerate() {
            match ch {
                b'1' => fp.set_bit(i),
                b'0' => {}
                _ => {
                    return Err(MolprintError::Parse(format!(
                        "invalid character '{}' at position {i} in bit string",
                        ch as char
                    )))
                }
            }
        }
        Ok(fp)
    }

    /// Little-endian byte packing, `ceil(nbits / 8)` bytes, as lowercase hex.
    pub fn to_hex(&self) -> String {
        let bytes: Vec<u8> = self
            .bits
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .take(self.nbits.div_ceil(8))
            .collect();
        hex::encode(bytes)
    }

    /// Inverse of [`Fingerprint::to_hex`].
    pub fn from_hex(s: &str, nbits: usize) -> Result<Self> {
        if nbits == 0 {
            return Err(MolprintError::InvalidInput("fingerprint width must be positive".into()));
        }
        let bytes = hex::decode(s).map_err(|e| MolprintError::Parse(format!("invalid hex fingerprint: {e}")))?;
        if bytes.len() != nbits.div_ceil(8) {
            return Err(MolprintError::Parse(format!(
                "hex fingerprint has {} bytes, expected {} for {nbits} bits",
                bytes.len(),
                nbits.div_ceil(8)
            )));
        }
        let mut fp = Fingerprint::new(nbits);
        for (i, chunk) in bytes.chunks(8).enumerate() {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            fp.bits[i] = u64::from_le_bytes(word);
        }
        if fp.on_bits_beyond_width() {
            return Err(MolprintError::Parse(format!("hex fingerprint sets bits past width {nbits}")));
        }
        Ok(fp)
    }

    /// Simulate a count with `bits_per_entry` bits: bit `i` of the bucket is
    /// set when `count > i`.
    pub(crate) fn set_count_bits(&mut self, bucket: usize, count: usize, bits_per_entry: usize) {
        for i in 0..bits_per_entry.min(count) {
            self.set_bit(bucket * bits_per_entry + i);
        }
    }

    fn on_bits_beyond_width(&self) -> bool {
        let tail = self.nbits % 64;
        tail != 0 && self.bits.last().is_some_and(|w| w >> tail != 0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

impl ContentAddressable for Fingerprint {
    fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.nbits as u64).to_le_bytes());
        for word in &self.bits {
            hasher.update(word.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Tanimoto similarity coefficient between two fingerprints.
///
/// Returns 1.0 for identical fingerprints (including two empty ones) and 0.0
/// for completely disjoint ones.
///
/// # Panics
///
/// Panics if the fingerprints have different widths.
pub fn tanimoto_similarity(fp1: &Fingerprint, fp2: &Fingerprint) -> f64 {
    assert_eq!(fp1.nbits, fp2.nbits, "fingerprints must have the same size");

    let mut and_count = 0u32;
    let mut or_count = 0u32;

    for (w1, w2) in fp1.bits.iter().zip(fp2.bits.iter()) {
        and_count += (w1 & w2).count_ones();
        or_count += (w1 | w2).count_ones();
    }

    if or_count == 0 {
        return 1.0;
    }

    and_count as f64 / or_count as f64
}

/// Compute Tanimoto similarity of a query against multiple targets.
pub fn tanimoto_bulk(query: &Fingerprint, targets: &[Fingerprint]) -> Vec<f64> {
    targets.iter().map(|t| tanimoto_similarity(query, t)).collect()
}

// FNV-1a hash functions for deterministic hashing
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

pub(crate) fn fnv1a_init() -> u64 {
    FNV_OFFSET
}

pub(crate) fn fnv1a_update(hash: u64, value: u64) -> u64 {
    let mut h = hash;
    for b in value.to_le_bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Hash a sequence of values with FNV-1a.
pub(crate) fn fnv1a_hash(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(fnv1a_init(), fnv1a_update)
}

pub(crate) fn fold_hash(hash: u64, nbits: usize) -> usize {
    (hash % nbits as u64) as usize
}
