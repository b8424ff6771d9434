use serde::{Deserialize, Serialize};

/// Scan settings shared by all search modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub base: u32,
    pub align: usize,
    pub limit: usize,
    pub verbose: bool,
    pub json: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base: 0xA0000000,
            align: 1,
            limit: 100,
            verbose: false,
            json: false,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.align == 0 {
            return Err("Invalid align value.".into());
        }
        Ok(())
    }
}
