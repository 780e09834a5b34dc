//! Core wire formats
//!
//! Field widths, the identifier/signature value types, and the codecs for
//! transactions, balance lists and blocks. Every decoder returns the value
//! together with the number of bytes it consumed.

pub mod balance_list;
pub mod block;
pub mod field_size;
pub mod transaction;
pub mod types;

pub use balance_list::{ApprovedCycleTransaction, BalanceList, BalanceListItem, FEE_INTERVAL};
pub use block::Block;
pub use transaction::{
    CycleSignatureLayout, CycleSignaturePair, CycleSignatureTransaction, CycleSignatures,
    Transaction, TransactionType, Transfer,
};
pub use types::{
    mask_height, pack_height_and_version, unpack_height_and_version, Identifier, Signature,
    TRANSFER_IDENTIFIER,
};
