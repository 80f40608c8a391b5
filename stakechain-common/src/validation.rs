//! Input validation utilities and patterns

use crate::{
    error::{LedgerError, LedgerResult},
    types::protocol::{MAX_DELEGATE_NAME_LEN, MIN_DELEGATE_NAME_LEN},
};

/// Validation utilities for ledger data
pub struct ValidationUtils;

impl ValidationUtils {
    /// Check a delegate name against `[a-z_]{4,16}`.
    pub fn is_valid_delegate_name(name: &[u8]) -> bool {
        (MIN_DELEGATE_NAME_LEN..=MAX_DELEGATE_NAME_LEN).contains(&name.len())
            && name.iter().all(|&b| b.is_ascii_lowercase() || b == b'_')
    }

    /// Validate a delegate name, describing the first problem found
    pub fn validate_delegate_name(name: &[u8]) -> LedgerResult<()> {
        if name.len() < MIN_DELEGATE_NAME_LEN || name.len() > MAX_DELEGATE_NAME_LEN {
            return Err(LedgerError::validation(format!(
                "Invalid delegate name length: expected {}..={}, got {}",
                MIN_DELEGATE_NAME_LEN,
                MAX_DELEGATE_NAME_LEN,
                name.len()
            )));
        }

        if let Some(bad) = name
            .iter()
            .find(|&&b| !(b.is_ascii_lowercase() || b == b'_'))
        {
            return Err(LedgerError::validation(format!(
                "Invalid delegate name character: 0x{:02x}",
                bad
            )));
        }

        Ok(())
    }
}
