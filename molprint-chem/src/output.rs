//! Labelled fingerprint sets and their `<label> <bitstring>` text form.

use std::fmt;
use std::io::Write;

use molprint_core::{MolprintError, Result};

use crate::fingerprint::Fingerprint;

/// Fingerprints of one molecule, in the order they were computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FingerprintSet {
    entries: Vec<(String, Fingerprint)>,
}

impl FingerprintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fingerprint. Labels must be unique and free of whitespace.
    pub fn push(&mut self, label: impl Into<String>, fp: Fingerprint) -> Result<()> {
        let label = label.into();
        if label.is_empty() || label.chars().any(char::is_whitespace) {
            return Err(MolprintError::InvalidInput(format!("invalid fingerprint label '{label}'")));
        }
        if self.get(&label).is_some() {
            return Err(MolprintError::InvalidInput(format!("duplicate fingerprint label '{label}'")));
        }
        self.entries.push((label, fp));
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&Fingerprint> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, fp)| fp)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.entries.iter().map(|(l, fp)| (l.as_str(), fp))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write one `<label> <bitstring>` line per fingerprint.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for (label, fp) in &self.entries {
            writeln!(out, "{label} {fp}")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Read back the output of [`FingerprintSet::write_to`]. Blank lines are
    /// skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut set = FingerprintSet::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(label), Some(bits), None) = (fields.next(), fields.next(), fields.next()) else {
                return Err(MolprintError::Parse(format!(
                    "line {}: expected '<label> <bitstring>'",
                    lineno + 1
                )));
            };
            let fp = Fingerprint::from_bit_string(bits)
                .map_err(|e| MolprintError::Parse(format!("line {}: {e}", lineno + 1)))?;
            set.push(label, fp)?;
        }
        Ok(set)
    }
}

impl fmt::Display for FingerprintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, fp) in &self.entries {
            writeln!(f, "{label} {fp}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FingerprintSet {
    type Item = (&'a str, &'a Fingerprint);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FingerprintSet {
        let mut set = FingerprintSet::new();
        set.push("b", Fingerprint::from_bit_string("0110").unwrap()).unwrap();
        set.push("a", Fingerprint::from_bit_string("10").unwrap()).unwrap();
        set
    }

    #[test]
    fn writes_lines_in_insertion_order() {
        let mut buf = Vec::new();
        sample().write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "b 0110\na 10\n");
        assert_eq!(sample().to_string(), "b 0110\na 10\n");
    }

    #[test]
    fn parse_reads_written_text() {
        let set = FingerprintSet::parse("b 0110\n\na 10\n").unwrap();
        assert_eq!(set, sample());
        assert_eq!(set.labels(), vec!["b", "a"]);
        assert_eq!(set.get("a").map(|fp| fp.nbits()), Some(2));
        assert!(set.get("c").is_none());
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        assert!(FingerprintSet::parse("ecfp6").is_err());
        assert!(FingerprintSet::parse("ecfp6 0101 extra").is_err());
        assert!(FingerprintSet::parse("ecfp6 01x1").is_err());
        assert!(FingerprintSet::parse("ecfp6 01\necfp6 10").is_err());
    }

    #[test]
    fn push_validates_labels() {
        let mut set = FingerprintSet::new();
        assert!(set.push("", Fingerprint::new(8)).is_err());
        assert!(set.push("two words", Fingerprint::new(8)).is_err());
        assert!(set.is_empty());
    }
}
