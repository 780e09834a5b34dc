use crate::core::field_size;
use crate::error::Result;
use crate::utils::ByteReader;
use serde::Serialize;

/// Ask a peer for the frozen blocks `start_height..=end_height`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockRequest {
    start_height: u64,
    end_height: u64,
    include_balance_list: bool,
}

impl BlockRequest {
    pub const BYTE_SIZE: usize = field_size::BLOCK_HEIGHT * 2 + field_size::BOOLEAN_FIELD;

    pub fn new(start_height: u64, end_height: u64, include_balance_list: bool) -> Self {
        BlockRequest {
            start_height,
            end_height,
            include_balance_list,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<BlockRequest> {
        let mut reader = ByteReader::new(bytes);
        Ok(BlockRequest {
            start_height: reader.read_u64("start height")?,
            end_height: reader.read_u64("end height")?,
            include_balance_list: reader.read_bool("include balance list")?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = Vec::with_capacity(Self::BYTE_SIZE);
        vbytes.extend(&self.start_height.to_be_bytes());
        vbytes.extend(&self.end_height.to_be_bytes());
        vbytes.push(u8::from(self.include_balance_list));
        vbytes
    }

    pub fn get_start_height(&self) -> u64 {
        self.start_height
    }

    pub fn get_end_height(&self) -> u64 {
        self.end_height
    }

    pub fn include_balance_list(&self) -> bool {
        self.include_balance_list
    }
}
