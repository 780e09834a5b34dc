use crate::core::{field_size, BalanceList, Block};
use crate::error::Result;
use crate::utils::ByteReader;
use log::debug;
use serde::Serialize;

/// Answer to a block request.
///
/// Wire form: has_balance_list(1) [+ balance list] + block count(2) + signed blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockResponse {
    initial_balance_list: Option<BalanceList>,
    blocks: Vec<Block>,
}

impl BlockResponse {
    pub fn new(initial_balance_list: Option<BalanceList>, blocks: Vec<Block>) -> Self {
        BlockResponse {
            initial_balance_list,
            blocks,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<BlockResponse> {
        let mut reader = ByteReader::new(bytes);
        let initial_balance_list = if reader.read_bool("has balance list")? {
            Some(BalanceList::read_from(&mut reader)?)
        } else {
            None
        };

        let block_count = reader.read_u16("block count")? as usize;
        let mut blocks = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            blocks.push(Block::read_from(&mut reader)?);
        }
        debug!(
            "Block response: balance list {}, {} blocks",
            initial_balance_list.is_some(),
            blocks.len()
        );

        Ok(BlockResponse {
            initial_balance_list,
            blocks,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let blocks = self.wire_blocks();
        let mut vbytes = Vec::with_capacity(self.byte_size());
        match &self.initial_balance_list {
            Some(balance_list) => {
                vbytes.push(1);
                balance_list.write_to(&mut vbytes);
            }
            None => vbytes.push(0),
        }
        vbytes.extend(&(blocks.len() as u16).to_be_bytes());
        for block in blocks {
            block.write_to(&mut vbytes, true);
        }
        vbytes
    }

    pub fn byte_size(&self) -> usize {
        let mut size = field_size::BOOLEAN_FIELD;
        if let Some(balance_list) = &self.initial_balance_list {
            size += balance_list.byte_size();
        }
        size += field_size::FROZEN_BLOCK_LIST_LENGTH;
        size += self
            .wire_blocks()
            .iter()
            .map(|block| block.byte_size(true))
            .sum::<usize>();
        size
    }

    pub fn get_initial_balance_list(&self) -> Option<&BalanceList> {
        self.initial_balance_list.as_ref()
    }

    pub fn get_blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn wire_blocks(&self) -> &[Block] {
        &self.blocks[..self.blocks.len().min(u16::MAX as usize)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BalanceListItem, Identifier};
    use crate::wallet::KeyPair;

    fn blocks() -> Vec<Block> {
        let key_pair = KeyPair::from_seed(&[8u8; 32]).unwrap();
        (5..7)
            .map(|height| {
                Block::new_block(0, height, [0u8; 32], 0, &[], [0u8; 32], &key_pair).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_round_trip_with_balance_list() {
        let balance_list = BalanceList {
            blockchain_version: 1,
            height: 5,
            rollover_fees: 0,
            previous_verifiers: vec![Identifier([4u8; 32]); 5],
            items: vec![BalanceListItem::new(Identifier([1u8; 32]), 99)],
            unlock_threshold: 3,
            unlock_transfer_sum: 4,
            pending_cycle_transactions: vec![],
            recently_approved_cycle_transactions: vec![],
        };
        let response = BlockResponse::new(Some(balance_list), blocks());
        let bytes = response.encode();
        assert_eq!(response.byte_size(), bytes.len());
        assert_eq!(BlockResponse::decode(&bytes).unwrap(), response);
    }

    #[test]
    fn test_round_trip_without_balance_list() {
        let response = BlockResponse::new(None, blocks());
        let bytes = response.encode();
        assert_eq!(bytes[0], 0);
        assert_eq!(&bytes[1..3], &[0, 2]);
        let decoded = BlockResponse::decode(&bytes).unwrap();
        assert!(decoded.get_initial_balance_list().is_none());
        assert_eq!(decoded.get_blocks().len(), 2);
    }
}
