// Widths, in bytes, of every fixed-size field on the wire

pub const BALANCE_LIST_LENGTH: usize = 4;
pub const BLOCK_HEIGHT: usize = 8;
pub const BLOCKS_UNTIL_FEE: usize = 2;
pub const BOOLEAN_FIELD: usize = 1;
pub const FROZEN_BLOCK_LIST_LENGTH: usize = 2;
pub const HASH: usize = 32;
pub const IDENTIFIER: usize = 32;
pub const MESSAGE_LENGTH: usize = 4;
pub const MESSAGE_TYPE: usize = 2;
pub const ROLLOVER_TRANSACTION_FEES: usize = 1;
pub const SEED: usize = 32;
pub const SIGNATURE: usize = 64;
pub const STRING_LENGTH: usize = 2;
pub const TIMESTAMP: usize = 8;
pub const TRANSACTION_AMOUNT: usize = 8;
pub const TRANSACTION_TYPE: usize = 1;
pub const UNNAMED_INTEGER: usize = 4;

// sender data is clamped to this many bytes
pub const MAX_SENDER_DATA: usize = 32;
