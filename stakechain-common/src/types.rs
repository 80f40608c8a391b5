//stakechain-common/src/types.rs
//! Common type definitions and constants used throughout Stakechain

/// Account address - 20-byte hash of the owner's public key
pub type Address = [u8; 20];

/// Hash type - 32-byte SHA-256
pub type Hash = [u8; 32];

/// Token amount in the smallest unit (nano)
pub type Amount = u64;

/// Per-account transaction counter
pub type Nonce = u64;

/// Monetary units
pub mod units {
    use super::Amount;

    /// Number of nano units in one whole token
    pub const NANO_PER_UNIT: Amount = 1_000_000_000;
}

/// Protocol constants shared by every node
pub mod protocol {
    use super::{units::NANO_PER_UNIT, Amount};

    /// Stake burned to register a delegate
    pub const DEFAULT_REGISTRATION_FEE: Amount = 1000 * NANO_PER_UNIT;

    /// Shortest accepted delegate name
    pub const MIN_DELEGATE_NAME_LEN: usize = 4;

    /// Longest accepted delegate name
    pub const MAX_DELEGATE_NAME_LEN: usize = 16;
}

/// Utility functions for common operations using extension traits
macro_rules! impl_byte_array_ext {
    ($name:ident, $len:expr) => {
        pub trait $name {
            /// Create an array filled with zeros
            fn zero() -> Self;
            /// Check if every byte in the array is zero
            fn is_zero(&self) -> bool;
            /// Lowercase hex rendering
            fn to_hex(&self) -> String;
        }

        impl $name for [u8; $len] {
            fn zero() -> Self {
                [0u8; $len]
            }

            fn is_zero(&self) -> bool {
                self.iter().all(|&b| b == 0)
            }

            fn to_hex(&self) -> String {
                hex::encode(self)
            }
        }
    };
}

impl_byte_array_ext!(AddressExt, 20);
impl_byte_array_ext!(HashExt, 32);
