// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::pyramid::{Pyramid, PyramidResult, validate_factors};

/// Stock zoom ladder: 64 samples per leaf entry, doubling up to 8192.
pub const DEFAULT_FACTORS: [usize; 8] = [64, 128, 256, 512, 1024, 2048, 4096, 8192];

pub const DEFAULT_HEIGHT: usize = 16;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PyramidConfig {
    pub factors: Vec<usize>,
    pub width: Option<usize>, // None = terminal width
    pub height: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            factors: DEFAULT_FACTORS.to_vec(),
            width: None,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl PyramidConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> PyramidResult<()> {
        validate_factors(&self.factors)
    }

    pub fn build(&self) -> PyramidResult<Pyramid> {
        Pyramid::from_factors(&self.factors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid::PyramidError;
    use std::io::Write;

    #[test]
    fn defaults_build_eight_levels() {
        let p = PyramidConfig::default().build().unwrap();
        assert_eq!(p.level_count(), 8);
        let abs: Vec<usize> = p.levels().map(|l| l.absolute_factor()).collect();
        assert_eq!(abs, DEFAULT_FACTORS.to_vec());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "factors": [4, 16] }}"#).unwrap();
        let cfg = PyramidConfig::load(f.path()).unwrap();
        assert_eq!(cfg.factors, vec![4, 16]);
        assert_eq!(cfg.height, DEFAULT_HEIGHT);
        assert_eq!(cfg.width, None);
    }

    #[test]
    fn bad_factors_fail_validation() {
        let cfg = PyramidConfig {
            factors: vec![64, 96],
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(PyramidError::NotDivisible { .. })));
        assert!(cfg.build().is_err());
    }
}
