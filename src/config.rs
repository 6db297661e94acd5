use crate::error::{CarveError, Result};

/// What to do when two carved fonts want the same file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Collisions {
    /// Keep the first file and suffix later ones with their source offset.
    #[default]
    Rename,
    /// Last write wins.
    Overwrite,
}

/// Runtime configuration for a carving run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fresh bytes read per scan step.
    pub chunk_size: usize,
    /// Carve fonts without a family name, naming them by content hash.
    pub save_unidentified: bool,
    /// Block size used when computing table checksums.
    pub checksum_buffer_size: usize,
    /// Block size used when hashing unnamed fonts.
    pub hash_buffer_size: usize,
    pub collisions: Collisions,
    /// Plan and report only, never write.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            save_unidentified: false,
            checksum_buffer_size: 4096,
            hash_buffer_size: 64 * 1024,
            collisions: Collisions::Rename,
            dry_run: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("chunk size", self.chunk_size),
            ("checksum buffer size", self.checksum_buffer_size),
            ("hash buffer size", self.hash_buffer_size),
        ];
        for (what, value) in sizes {
            if value == 0 {
                return Err(CarveError::Config(format!("{what} must be positive")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert!(!cfg.save_unidentified);
        assert_eq!(cfg.collisions, Collisions::Rename);
    }

    #[test]
    fn zero_sizes_rejected() {
        let cfg = Config {
            chunk_size: 0,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(CarveError::Config(_))));
        let cfg = Config {
            checksum_buffer_size: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = Config {
            hash_buffer_size: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
