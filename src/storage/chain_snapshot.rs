use crate::core::{BalanceList, Block};
use crate::error::{NyzoError, Result};
use crate::utils::ByteReader;
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Everything decoded from a chain-snapshot stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSnapshot {
    pub blocks: Vec<Block>,
    // one per chain segment, in stream order
    pub balance_lists: Vec<BalanceList>,
    pub consumed: usize,
}

/// Decode a snapshot stream: `u16` block count, then signed blocks. The first
/// block, and any block whose height does not follow the previous one, is
/// immediately followed by the balance list for its segment.
pub fn read_snapshot(bytes: &[u8]) -> Result<ChainSnapshot> {
    let mut reader = ByteReader::new(bytes);
    let block_count = reader.read_u16("block count")? as usize;

    let mut blocks = Vec::with_capacity(block_count);
    let mut balance_lists = vec![];
    let mut last_height: Option<u64> = None;

    for index in 0..block_count {
        let block = Block::read_from(&mut reader)?;
        let height = block.get_height();
        let continuous = last_height.and_then(|last| last.checked_add(1)) == Some(height);
        if index == 0 || !continuous {
            let balance_list = BalanceList::read_from(&mut reader)?;
            debug!(
                "Balance list for height {} follows block {height}",
                balance_list.height
            );
            balance_lists.push(balance_list);
        }
        last_height = Some(height);
        blocks.push(block);
    }

    Ok(ChainSnapshot {
        blocks,
        balance_lists,
        consumed: reader.offset(),
    })
}

/// Blocks of a snapshot stream; balance lists are decoded and dropped
pub fn read(bytes: &[u8]) -> Result<Vec<Block>> {
    Ok(read_snapshot(bytes)?.blocks)
}

/// Read a `.nyzoblock` file
pub fn read_file(path: &Path) -> Result<Vec<Block>> {
    let bytes =
        fs::read(path).map_err(|e| NyzoError::Io(format!("{}: {e}", path.display())))?;
    let blocks = read(&bytes)?;
    info!("Read {} blocks from {}", blocks.len(), path.display());
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BalanceListItem;
    use crate::core::Identifier;
    use crate::wallet::KeyPair;

    fn block(height: u64, key_pair: &KeyPair) -> Block {
        Block::new_block(0, height, [0u8; 32], 0, &[], [0u8; 32], key_pair).unwrap()
    }

    fn balance_list(height: u64) -> BalanceList {
        BalanceList {
            blockchain_version: 0,
            height,
            rollover_fees: 0,
            previous_verifiers: vec![
                Identifier([9u8; 32]);
                BalanceList::previous_verifier_count(height)
            ],
            items: vec![BalanceListItem::new(Identifier([1u8; 32]), 10)],
            unlock_threshold: 0,
            unlock_transfer_sum: 0,
            pending_cycle_transactions: vec![],
            recently_approved_cycle_transactions: vec![],
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = read_snapshot(&[0, 0]).unwrap();
        assert!(snapshot.blocks.is_empty());
        assert_eq!(snapshot.consumed, 2);
    }

    #[test]
    fn test_discontinuity_carries_a_second_balance_list() {
        let key_pair = KeyPair::from_seed(&[5u8; 32]).unwrap();
        let mut bytes = 3u16.to_be_bytes().to_vec();
        bytes.extend(block(4, &key_pair).encode(true));
        bytes.extend(balance_list(4).encode().unwrap());
        bytes.extend(block(5, &key_pair).encode(true));
        bytes.extend(block(20, &key_pair).encode(true));
        bytes.extend(balance_list(20).encode().unwrap());

        let snapshot = read_snapshot(&bytes).unwrap();
        let heights: Vec<u64> = snapshot.blocks.iter().map(|b| b.get_height()).collect();
        assert_eq!(heights, vec![4, 5, 20]);
        assert_eq!(snapshot.balance_lists.len(), 2);
        assert_eq!(snapshot.balance_lists[1].height, 20);
        assert_eq!(snapshot.consumed, bytes.len());
    }

    #[test]
    fn test_missing_balance_list_is_malformed() {
        let key_pair = KeyPair::from_seed(&[5u8; 32]).unwrap();
        let mut bytes = 1u16.to_be_bytes().to_vec();
        bytes.extend(block(4, &key_pair).encode(true));
        assert!(read(&bytes).is_err());
    }

    #[test]
    fn test_read_file() {
        let key_pair = KeyPair::from_seed(&[5u8; 32]).unwrap();
        let mut bytes = 1u16.to_be_bytes().to_vec();
        bytes.extend(block(0, &key_pair).encode(true));
        bytes.extend(balance_list(0).encode().unwrap());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("i_000000000.nyzoblock");
        fs::write(&path, &bytes).unwrap();
        let blocks = read_file(&path).unwrap();
        assert_eq!(blocks.len(), 1);

        let missing = read_file(&dir.path().join("missing.nyzoblock"));
        assert!(matches!(missing, Err(NyzoError::Io(_))));
    }
}
