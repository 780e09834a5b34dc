// Balance list layout, in wire order:
//   packed version/height(8) rollover_fees(1) previous_verifiers(32 each, min(height, 9))
//   item count(4) + items(identifier 32, balance 8, blocks_until_fee 2)
//   version >= 1: unlock_threshold(8) unlock_transfer_sum(8)
//   version >= 2: pending count(4) + cycle transactions, approved count(4) + 80-byte records

use crate::core::field_size;
use crate::core::transaction::{CycleSignatureLayout, Transaction};
use crate::core::types::{
    pack_height_and_version, unpack_height_and_version, Identifier, TRANSFER_IDENTIFIER,
};
use crate::error::Result;
use crate::utils::{double_sha256, ByteReader};
use log::debug;
use serde::Serialize;

/// Blocks between periodic account fees
pub const FEE_INTERVAL: u16 = 500;

const MAX_PREVIOUS_VERIFIERS: u64 = 9;

const ITEM_SIZE: usize =
    field_size::IDENTIFIER + field_size::TRANSACTION_AMOUNT + field_size::BLOCKS_UNTIL_FEE;

pub const APPROVED_CYCLE_TRANSACTION_SIZE: usize = field_size::IDENTIFIER * 2
    + field_size::BLOCK_HEIGHT
    + field_size::TRANSACTION_AMOUNT;

/// One account's balance. The transfer account never pays the periodic fee,
/// so its `blocks_until_fee` is always 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceListItem {
    identifier: Identifier,
    balance: u64,
    blocks_until_fee: u16,
}

impl BalanceListItem {
    pub fn new(identifier: Identifier, balance: u64) -> Self {
        BalanceListItem::with_blocks_until_fee(identifier, balance, FEE_INTERVAL)
    }

    pub fn with_blocks_until_fee(
        identifier: Identifier,
        balance: u64,
        blocks_until_fee: u16,
    ) -> Self {
        let blocks_until_fee = if identifier == TRANSFER_IDENTIFIER {
            0
        } else {
            blocks_until_fee
        };
        BalanceListItem {
            identifier,
            balance,
            blocks_until_fee,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn blocks_until_fee(&self) -> u16 {
        self.blocks_until_fee
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedCycleTransaction {
    pub initiator_identifier: Identifier,
    pub receiver_identifier: Identifier,
    pub approval_height: u64,
    pub amount: u64,
}

impl ApprovedCycleTransaction {
    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(ApprovedCycleTransaction {
            initiator_identifier: Identifier(reader.read_array("approved initiator")?),
            receiver_identifier: Identifier(reader.read_array("approved receiver")?),
            approval_height: reader.read_u64("approval height")?,
            amount: reader.read_u64("approved amount")?,
        })
    }

    fn write_to(&self, vbytes: &mut Vec<u8>) {
        vbytes.extend(self.initiator_identifier.as_bytes());
        vbytes.extend(self.receiver_identifier.as_bytes());
        vbytes.extend(&self.approval_height.to_be_bytes());
        vbytes.extend(&self.amount.to_be_bytes());
    }
}

/// Snapshot of every account balance at `height`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceList {
    pub blockchain_version: u16,
    pub height: u64,
    pub rollover_fees: u8,
    pub previous_verifiers: Vec<Identifier>,
    pub items: Vec<BalanceListItem>,
    // version 1 and later
    pub unlock_threshold: u64,
    pub unlock_transfer_sum: u64,
    // version 2 and later
    pub pending_cycle_transactions: Vec<Transaction>,
    pub recently_approved_cycle_transactions: Vec<ApprovedCycleTransaction>,
}

impl BalanceList {
    /// Number of previous verifiers stored for a list at `height`
    pub fn previous_verifier_count(height: u64) -> usize {
        height.min(MAX_PREVIOUS_VERIFIERS) as usize
    }

    /// Decode a balance list from the start of `bytes`; returns it with the
    /// number of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> Result<(BalanceList, usize)> {
        let mut reader = ByteReader::new(bytes);
        let (blockchain_version, height) =
            unpack_height_and_version(reader.read_u64("balance list height")?);
        let rollover_fees = reader.read_u8("rollover fees")?;

        let verifier_count = BalanceList::previous_verifier_count(height);
        let mut previous_verifiers = Vec::with_capacity(verifier_count);
        for _ in 0..verifier_count {
            previous_verifiers.push(Identifier(reader.read_array("previous verifier")?));
        }

        let item_count = reader.read_u32("balance list length")? as usize;
        let mut items = Vec::with_capacity(reader.capacity_hint(item_count, ITEM_SIZE));
        for _ in 0..item_count {
            let identifier = Identifier(reader.read_array("balance identifier")?);
            let balance = reader.read_u64("balance")?;
            let blocks_until_fee = reader.read_u16("blocks until fee")?;
            items.push(BalanceListItem::with_blocks_until_fee(
                identifier,
                balance,
                blocks_until_fee,
            ));
        }

        let mut unlock_threshold = 0;
        let mut unlock_transfer_sum = 0;
        if blockchain_version > 0 {
            unlock_threshold = reader.read_u64("unlock threshold")?;
            unlock_transfer_sum = reader.read_u64("unlock transfer sum")?;
        }

        let mut pending_cycle_transactions = vec![];
        let mut recently_approved_cycle_transactions = vec![];
        if blockchain_version > 1 {
            let layout = CycleSignatureLayout::for_version(blockchain_version);
            let pending_count = reader.read_u32("pending cycle transaction count")? as usize;
            for _ in 0..pending_count {
                pending_cycle_transactions.push(Transaction::read_from(&mut reader, layout)?);
            }

            let approved_count = reader.read_u32("approved cycle transaction count")? as usize;
            recently_approved_cycle_transactions = Vec::with_capacity(
                reader.capacity_hint(approved_count, APPROVED_CYCLE_TRANSACTION_SIZE),
            );
            for _ in 0..approved_count {
                recently_approved_cycle_transactions
                    .push(ApprovedCycleTransaction::read_from(&mut reader)?);
            }
        }

        debug!(
            "Decoded balance list v{blockchain_version} at height {height}: {} items, {} bytes",
            items.len(),
            reader.offset()
        );

        let balance_list = BalanceList {
            blockchain_version,
            height,
            rollover_fees,
            previous_verifiers,
            items,
            unlock_threshold,
            unlock_transfer_sum,
            pending_cycle_transactions,
            recently_approved_cycle_transactions,
        };
        Ok((balance_list, reader.offset()))
    }

    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        reader.decode_with(BalanceList::decode)
    }

    /// Fails when a pending cycle transaction cannot be written in the layout
    /// this list's version requires.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.check_layout()?;
        let mut vbytes = Vec::with_capacity(self.byte_size());
        self.write_to(&mut vbytes);
        Ok(vbytes)
    }

    pub fn check_layout(&self) -> Result<()> {
        let layout = self.cycle_signature_layout();
        for transaction in &self.pending_cycle_transactions {
            transaction.check_layout(layout)?;
        }
        Ok(())
    }

    fn cycle_signature_layout(&self) -> CycleSignatureLayout {
        CycleSignatureLayout::for_version(self.blockchain_version)
    }

    pub fn write_to(&self, vbytes: &mut Vec<u8>) {
        vbytes.extend(&pack_height_and_version(self.blockchain_version, self.height).to_be_bytes());
        vbytes.push(self.rollover_fees);

        // exactly min(height, 9) verifiers go out, zero-filled if the list is short
        let verifier_count = BalanceList::previous_verifier_count(self.height);
        for index in 0..verifier_count {
            let verifier = self
                .previous_verifiers
                .get(index)
                .copied()
                .unwrap_or_default();
            vbytes.extend(verifier.as_bytes());
        }

        vbytes.extend(&(self.items.len() as u32).to_be_bytes());
        for item in &self.items {
            vbytes.extend(item.identifier.as_bytes());
            vbytes.extend(&item.balance.to_be_bytes());
            vbytes.extend(&item.blocks_until_fee.to_be_bytes());
        }

        if self.blockchain_version > 0 {
            vbytes.extend(&self.unlock_threshold.to_be_bytes());
            vbytes.extend(&self.unlock_transfer_sum.to_be_bytes());
        }

        if self.blockchain_version > 1 {
            vbytes.extend(&(self.pending_cycle_transactions.len() as u32).to_be_bytes());
            let layout = self.cycle_signature_layout();
            for transaction in &self.pending_cycle_transactions {
                transaction.write_to(vbytes, false, layout);
            }
            vbytes.extend(&(self.recently_approved_cycle_transactions.len() as u32).to_be_bytes());
            for approved in &self.recently_approved_cycle_transactions {
                approved.write_to(vbytes);
            }
        }
    }

    pub fn byte_size(&self) -> usize {
        let mut size = field_size::BLOCK_HEIGHT
            + field_size::ROLLOVER_TRANSACTION_FEES
            + field_size::IDENTIFIER * BalanceList::previous_verifier_count(self.height)
            + field_size::BALANCE_LIST_LENGTH
            + ITEM_SIZE * self.items.len();

        if self.blockchain_version > 0 {
            size += field_size::TRANSACTION_AMOUNT * 2;
        }

        if self.blockchain_version > 1 {
            let layout = self.cycle_signature_layout();
            size += field_size::UNNAMED_INTEGER;
            size += self
                .pending_cycle_transactions
                .iter()
                .map(|transaction| transaction.byte_size(false, layout))
                .sum::<usize>();
            size += field_size::UNNAMED_INTEGER;
            size +=
                APPROVED_CYCLE_TRANSACTION_SIZE * self.recently_approved_cycle_transactions.len();
        }

        size
    }

    /// Double SHA-256 of the encoded list; blocks commit to this value
    pub fn hash(&self) -> Result<[u8; field_size::HASH]> {
        Ok(double_sha256(&self.encode()?))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{
        CycleSignaturePair, CycleSignatureTransaction, CycleSignatures, Transfer,
    };
    use crate::error::NyzoError;
    use crate::core::types::Signature;

    fn identifier(byte: u8) -> Identifier {
        Identifier([byte; 32])
    }

    fn balance_list(version: u16, height: u64) -> BalanceList {
        BalanceList {
            blockchain_version: version,
            height,
            rollover_fees: 3,
            previous_verifiers: (0..BalanceList::previous_verifier_count(height))
                .map(|i| identifier(0x80 + i as u8))
                .collect(),
            items: vec![
                BalanceListItem::new(identifier(0x01), 1_000),
                BalanceListItem::with_blocks_until_fee(identifier(0x02), 2_000, 17),
                BalanceListItem::new(TRANSFER_IDENTIFIER, 3_000),
            ],
            unlock_threshold: 0,
            unlock_transfer_sum: 0,
            pending_cycle_transactions: vec![],
            recently_approved_cycle_transactions: vec![],
        }
    }

    fn assert_round_trip(list: &BalanceList) {
        let bytes = list.encode().unwrap();
        assert_eq!(list.byte_size(), bytes.len());
        let (decoded, consumed) = BalanceList::decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(&decoded, list);
    }

    #[test]
    fn test_version_0_round_trip() {
        let list = balance_list(0, 20);
        assert_round_trip(&list);
        // height, rollover, 9 verifiers, count, 3 items
        assert_eq!(list.byte_size(), 8 + 1 + 9 * 32 + 4 + 3 * 42);
    }

    #[test]
    fn test_version_1_round_trip() {
        let mut list = balance_list(1, 4);
        list.unlock_threshold = 10_000;
        list.unlock_transfer_sum = 250;
        assert_round_trip(&list);
        assert_eq!(list.byte_size(), balance_list(0, 4).byte_size() + 16);
    }

    #[test]
    fn test_version_2_round_trip_with_cycle_transactions() {
        let parent = Transfer {
            timestamp: 1,
            amount: 50_000,
            receiver_identifier: identifier(0x09),
            previous_hash_height: 3,
            previous_block_hash: [0u8; 32],
            sender_identifier: identifier(0x0a),
            sender_data: vec![],
            signature: Signature([0x0b; 64]),
        };
        let child = CycleSignatureTransaction {
            timestamp: 2,
            sender_identifier: identifier(0x0c),
            vote: true,
            cycle_transaction_signature: parent.signature,
            signature: Signature([0x0d; 64]),
        };

        let mut list = balance_list(2, 100);
        list.unlock_threshold = 1;
        list.unlock_transfer_sum = 2;
        list.pending_cycle_transactions = vec![Transaction::Cycle {
            transfer: parent,
            cycle_signatures: CycleSignatures::Transactions(vec![child]),
        }];
        list.recently_approved_cycle_transactions = vec![ApprovedCycleTransaction {
            initiator_identifier: identifier(0x0e),
            receiver_identifier: identifier(0x0f),
            approval_height: 90,
            amount: 7,
        }];
        assert_round_trip(&list);
    }

    #[test]
    fn test_version_2_pairs_are_rejected() {
        let pending = Transaction::Cycle {
            transfer: Transfer {
                timestamp: 1,
                amount: 50_000,
                receiver_identifier: identifier(0x09),
                previous_hash_height: 3,
                previous_block_hash: [0u8; 32],
                sender_identifier: identifier(0x0a),
                sender_data: vec![],
                signature: Signature([0x0b; 64]),
            },
            cycle_signatures: CycleSignatures::Pairs(
                (0..35u8)
                    .map(|i| CycleSignaturePair {
                        identifier: identifier(0x20 + i),
                        signature: Signature([i; 64]),
                    })
                    .collect(),
            ),
        };
        let mut list = balance_list(2, 100);
        list.pending_cycle_transactions = vec![pending];
        assert!(matches!(list.encode(), Err(NyzoError::LayoutMismatch(_))));
        assert!(list.hash().is_err());

        // written through the infallible path the list still decodes cleanly
        let mut bytes = vec![];
        list.write_to(&mut bytes);
        assert_eq!(list.byte_size(), bytes.len());
        let (decoded, consumed) = BalanceList::decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded.pending_cycle_transactions.len(), 1);
    }

    #[test]
    fn test_previous_verifier_count_follows_height() {
        assert_eq!(BalanceList::previous_verifier_count(0), 0);
        assert_eq!(BalanceList::previous_verifier_count(1), 1);
        assert_eq!(BalanceList::previous_verifier_count(9), 9);
        assert_eq!(BalanceList::previous_verifier_count(10), 9);

        for height in [0u64, 1, 9, 10] {
            let bytes = balance_list(0, height).encode().unwrap();
            let (decoded, _) = BalanceList::decode(&bytes).unwrap();
            assert_eq!(
                decoded.previous_verifiers.len(),
                BalanceList::previous_verifier_count(height)
            );
        }
    }

    #[test]
    fn test_short_verifier_list_keeps_size_consistent() {
        let mut list = balance_list(0, 20);
        list.previous_verifiers.truncate(2);
        assert_eq!(list.byte_size(), list.encode().unwrap().len());
    }

    #[test]
    fn test_transfer_identifier_never_pays_fee() {
        assert_eq!(BalanceListItem::new(TRANSFER_IDENTIFIER, 1).blocks_until_fee(), 0);
        assert_eq!(BalanceListItem::new(identifier(0x01), 1).blocks_until_fee(), FEE_INTERVAL);

        // a stray non-zero counter on the wire is normalised on decode
        let list = balance_list(0, 0);
        let mut bytes = list.encode().unwrap();
        let last_counter = bytes.len() - 2;
        bytes[last_counter..].copy_from_slice(&500u16.to_be_bytes());
        let (decoded, _) = BalanceList::decode(&bytes).unwrap();
        assert_eq!(decoded.items[2].identifier(), &TRANSFER_IDENTIFIER);
        assert_eq!(decoded.items[2].blocks_until_fee(), 0);
    }

    #[test]
    fn test_truncated_list_is_malformed() {
        let bytes = balance_list(1, 5).encode().unwrap();
        assert!(BalanceList::decode(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn test_hash_tracks_content() {
        let list = balance_list(0, 5);
        let mut changed = list.clone();
        changed.rollover_fees = 4;
        assert_eq!(list.hash().unwrap(), double_sha256(&list.encode().unwrap()));
        assert_ne!(list.hash().unwrap(), changed.hash().unwrap());
    }
}
