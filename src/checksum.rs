//! Checksum utilities for load batches
//!
//! A published catalog carries the SHA-256 of every definition it was
//! compiled from, so callers can tell whether a reload changed anything.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::definition::SchemaDefinition;
use crate::error::Result;

/// SHA256 checksum
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First twelve hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incremental checksum over the `(segments, definition)` pairs of one batch
pub struct BatchChecksum {
    hasher: Sha256,
    entries: usize,
}

impl Default for BatchChecksum {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchChecksum {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            entries: 0,
        }
    }

    pub fn add<S: AsRef<str>>(&mut self, segments: &[S], definition: &SchemaDefinition) -> Result<()> {
        for segment in segments {
            self.hasher.update(segment.as_ref().as_bytes());
            self.hasher.update([0x1f]);
        }
        self.hasher.update([0x1e]);
        self.hasher.update(serde_json::to_vec(definition)?);
        self.hasher.update([0x1d]);
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn finish(self) -> Checksum {
        Checksum(format!("{:x}", self.hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PropertySpec;

    fn definition(type_name: &str) -> SchemaDefinition {
        SchemaDefinition::new("Company").with_property(PropertySpec::new("id", ["id"]).typed(type_name))
    }

    fn batch(segments: &[&str], def: &SchemaDefinition) -> Checksum {
        let mut checksum = BatchChecksum::new();
        checksum.add(segments, def).unwrap();
        checksum.finish()
    }

    #[test]
    fn test_checksum_consistency() {
        let def = definition("integer");
        assert_eq!(batch(&["test"], &def), batch(&["test"], &def));
        assert_eq!(BatchChecksum::new().finish(), BatchChecksum::new().finish());
        assert_ne!(batch(&["test"], &def), BatchChecksum::new().finish());
    }

    #[test]
    fn test_checksum_tracks_content_and_location() {
        let def = definition("integer");
        assert_ne!(batch(&["test"], &def), batch(&["test"], &definition("float")));
        assert_ne!(batch(&["test"], &def), batch(&["other"], &def));
        assert_ne!(batch(&["a", "b"], &def), batch(&["ab"], &def));
    }

    #[test]
    fn test_short_form() {
        let checksum = batch(&["test"], &definition("integer"));
        assert_eq!(checksum.as_str().len(), 64);
        assert_eq!(checksum.short().len(), 12);
        assert!(checksum.as_str().starts_with(checksum.short()));
    }
}
