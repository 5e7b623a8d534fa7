//! Fingerprint generation parameters.

use molprint_core::{MolprintError, Result};

/// Widths and limits shared by the hashed fingerprint generators.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FingerprintConfig {
    /// Width of Morgan, atom-pair, torsion and path fingerprints.
    pub nbits: usize,
    /// Bits set per hashed subgraph in path fingerprints.
    pub bits_per_hash: usize,
    /// Bits per count bucket in atom-pair and torsion fingerprints.
    pub bits_per_entry: usize,
    /// Largest topological distance encoded in an atom pair.
    pub max_pair_distance: usize,
    /// Smallest subgraph, in bonds, hashed by path fingerprints.
    pub min_path: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        FingerprintConfig {
            nbits: 1024,
            bits_per_hash: 2,
            bits_per_entry: 4,
            max_pair_distance: 30,
            min_path: 1,
        }
    }
}

impl FingerprintConfig {
    /// Check that the parameters describe a usable fingerprint.
    pub fn validate(&self) -> Result<()> {
        if self.nbits == 0 {
            return Err(MolprintError::InvalidInput("nbits must be positive".into()));
        }
        if self.bits_per_hash == 0 {
            return Err(MolprintError::InvalidInput("bits_per_hash must be positive".into()));
        }
        if self.bits_per_entry == 0 || self.nbits % self.bits_per_entry != 0 {
            return Err(MolprintError::InvalidInput(format!(
                "bits_per_entry ({}) must be positive and divide nbits ({})",
                self.bits_per_entry, self.nbits
            )));
        }
        if self.max_pair_distance == 0 {
            return Err(MolprintError::InvalidInput("max_pair_distance must be positive".into()));
        }
        if self.min_path == 0 {
            return Err(MolprintError::InvalidInput("min_path must be positive".into()));
        }
        Ok(())
    }

    /// Number of count buckets in atom-pair and torsion fingerprints.
    pub fn buckets(&self) -> usize {
        self.nbits / self.bits_per_entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = FingerprintConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buckets(), 256);
    }

    #[test]
    fn rejects_bad_widths() {
        let zero = FingerprintConfig { nbits: 0, ..Default::default() };
        assert!(zero.validate().is_err());
        let uneven = FingerprintConfig { nbits: 1022, ..Default::default() };
        assert!(uneven.validate().is_err());
        let no_entry = FingerprintConfig { bits_per_entry: 0, ..Default::default() };
        assert!(no_entry.validate().is_err());
        let no_path = FingerprintConfig { min_path: 0, ..Default::default() };
        assert!(no_path.validate().is_err());
    }
}
