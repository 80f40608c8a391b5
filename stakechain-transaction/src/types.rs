use serde::{Deserialize, Serialize};
use stakechain_common::types::{Address, Amount, Nonce};
use std::fmt;

/// Kind of state transition a transaction requests.
///
/// `Unknown` carries the raw type byte of kinds this node does not implement;
/// they pay the fee and otherwise do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Transfer,
    Delegate,
    Vote,
    Unvote,
    Unknown(u8),
}

impl TransactionType {
    pub const TRANSFER: u8 = 0x01;
    pub const DELEGATE: u8 = 0x02;
    pub const VOTE: u8 = 0x03;
    pub const UNVOTE: u8 = 0x04;

    pub fn from_byte(byte: u8) -> Self {
        match byte {
            Self::TRANSFER => Self::Transfer,
            Self::DELEGATE => Self::Delegate,
            Self::VOTE => Self::Vote,
            Self::UNVOTE => Self::Unvote,
            other => Self::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Transfer => Self::TRANSFER,
            Self::Delegate => Self::DELEGATE,
            Self::Vote => Self::VOTE,
            Self::Unvote => Self::UNVOTE,
            Self::Unknown(byte) => byte,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "TRANSFER"),
            Self::Delegate => write!(f, "DELEGATE"),
            Self::Vote => write!(f, "VOTE"),
            Self::Unvote => write!(f, "UNVOTE"),
            Self::Unknown(byte) => write!(f, "UNKNOWN(0x{:02x})", byte),
        }
    }
}

/// A parsed, signature-verified transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_type: TransactionType,
    pub from: Address,
    pub to: Address,
    pub value: Amount,
    pub fee: Amount,
    pub nonce: Nonce,
    /// Delegate name for DELEGATE; ignored otherwise
    pub data: Vec<u8>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tx_type: TransactionType,
        from: Address,
        to: Address,
        value: Amount,
        fee: Amount,
        nonce: Nonce,
        data: Vec<u8>,
    ) -> Self {
        Self {
            tx_type,
            from,
            to,
            value,
            fee,
            nonce,
            data,
        }
    }

    pub fn transfer(from: Address, to: Address, value: Amount, fee: Amount, nonce: Nonce) -> Self {
        Self::new(TransactionType::Transfer, from, to, value, fee, nonce, Vec::new())
    }

    /// Self-registration of `from` as a delegate named `name`
    pub fn delegate(from: Address, name: &[u8], value: Amount, fee: Amount, nonce: Nonce) -> Self {
        Self::new(TransactionType::Delegate, from, from, value, fee, nonce, name.to_vec())
    }

    pub fn vote(from: Address, delegate: Address, value: Amount, fee: Amount, nonce: Nonce) -> Self {
        Self::new(TransactionType::Vote, from, delegate, value, fee, nonce, Vec::new())
    }

    pub fn unvote(from: Address, delegate: Address, value: Amount, fee: Amount, nonce: Nonce) -> Self {
        Self::new(TransactionType::Unvote, from, delegate, value, fee, nonce, Vec::new())
    }
}

/// Outcome of one transaction, positionally matched to the input batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub success: bool,
    /// Structured return data; empty for every current transaction kind
    pub output: Vec<u8>,
}

impl TransactionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
