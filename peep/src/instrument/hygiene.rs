//! Hygienic identifier generation
//!
//! Injected code declares variables inside the user's `main`. Their names
//! carry a random hex suffix so they cannot shadow or collide with user
//! identifiers, and a per-run registry rejects a suffix that was already
//! issued.

use std::collections::HashSet;

use crate::domain::{HygienicNamePair, Result};

pub const HANDLE_PREFIX: &str = "f_";
pub const ERROR_PREFIX: &str = "err_";

/// Bytes of entropy per suffix (8 hex digits)
const SUFFIX_BYTES: usize = 4;

/// Issues [`HygienicNamePair`]s that are unique for the generator's lifetime.
#[derive(Debug, Default)]
pub struct NameGenerator {
    issued: HashSet<String>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a fresh suffix and derive the handle and error names from it.
    ///
    /// # Errors
    /// `Entropy` if the OS random source fails.
    pub fn generate_pair(&mut self) -> Result<HygienicNamePair> {
        loop {
            let suffix = random_suffix()?;
            if self.issued.insert(suffix.clone()) {
                return Ok(HygienicNamePair {
                    handle: format!("{HANDLE_PREFIX}{suffix}"),
                    error: format!("{ERROR_PREFIX}{suffix}"),
                });
            }
            log::debug!("Suffix {suffix} already issued, drawing again");
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

fn random_suffix() -> Result<String> {
    let mut bytes = [0u8; SUFFIX_BYTES];
    getrandom::getrandom(&mut bytes)?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}
