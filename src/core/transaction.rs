// Transactions are a tagged union over five kinds. Every kind starts with
// type(1) + timestamp(8); what follows depends on the kind, and Seed/Standard/Cycle
// change shape again between the wire form and the form that gets signed.
//
// Wire form of a transfer (Seed, Standard, Cycle):
//   amount(8) receiver(32) previous_hash_height(8) sender(32)
//   sender_data_length(1) sender_data(0..=32) signature(64)
//   [Cycle only] count(4) + cycle signatures
// Signing form replaces previous_hash_height with the 32-byte previous block hash,
// replaces length + sender_data with double_sha256(sender_data), and stops there.

use crate::core::field_size;
use crate::core::types::{mask_height, Identifier, Signature};
use crate::error::{NyzoError, Result};
use crate::utils::{current_timestamp, double_sha256, serialize_hex, ByteReader};
use crate::wallet::{verify_signature, KeyPair};
use log::{debug, warn};
use serde::Serialize;

const FEE_DIVISOR: u64 = 400;

// identifier + signature
const CYCLE_SIGNATURE_PAIR_SIZE: usize = field_size::IDENTIFIER + field_size::SIGNATURE;
// timestamp + sender + vote + signature
const CYCLE_SIGNATURE_CHILD_SIZE: usize = field_size::TIMESTAMP
    + field_size::IDENTIFIER
    + field_size::BOOLEAN_FIELD
    + field_size::SIGNATURE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum TransactionType {
    CoinGeneration = 0,
    Seed = 1,
    Standard = 2,
    Cycle = 3,
    CycleSignature = 4,
}

impl TryFrom<u8> for TransactionType {
    type Error = NyzoError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(TransactionType::CoinGeneration),
            1 => Ok(TransactionType::Seed),
            2 => Ok(TransactionType::Standard),
            3 => Ok(TransactionType::Cycle),
            4 => Ok(TransactionType::CycleSignature),
            other => Err(NyzoError::UnknownTransactionType(other)),
        }
    }
}

/// How the signature list trailing a Cycle transaction is laid out.
///
/// Blocks and balance lists from blockchain version 2 on carry full child
/// cycle-signature transactions; older ones carry bare `(identifier, signature)`
/// pairs. The caller derives this from the version of the structure it is decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSignatureLayout {
    Pairs,
    Transactions,
}

impl CycleSignatureLayout {
    pub fn for_version(blockchain_version: u16) -> Self {
        if blockchain_version > 1 {
            CycleSignatureLayout::Transactions
        } else {
            CycleSignatureLayout::Pairs
        }
    }
}

/// Fields shared by Seed, Standard and Cycle transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub timestamp: u64,
    pub amount: u64,
    pub receiver_identifier: Identifier,
    pub previous_hash_height: u64,
    // Only part of the signing form; a decoded transfer leaves it zeroed
    // until the caller looks the hash up by height.
    #[serde(serialize_with = "serialize_hex")]
    pub previous_block_hash: [u8; field_size::HASH],
    pub sender_identifier: Identifier,
    #[serde(serialize_with = "serialize_hex")]
    pub sender_data: Vec<u8>,
    pub signature: Signature,
}

impl Transfer {
    fn decode(reader: &mut ByteReader<'_>, timestamp: u64) -> Result<Transfer> {
        let amount = reader.read_u64("amount")?;
        let receiver_identifier = Identifier(reader.read_array("receiver identifier")?);
        let previous_hash_height = mask_height(reader.read_u64("previous hash height")?);
        let sender_identifier = Identifier(reader.read_array("sender identifier")?);
        let sender_data_length =
            (reader.read_u8("sender data length")? as usize).min(field_size::MAX_SENDER_DATA);
        let sender_data = reader.take(sender_data_length, "sender data")?.to_vec();
        let signature = Signature(reader.read_array("transaction signature")?);

        Ok(Transfer {
            timestamp,
            amount,
            receiver_identifier,
            previous_hash_height,
            previous_block_hash: [0u8; field_size::HASH],
            sender_identifier,
            sender_data,
            signature,
        })
    }

    /// Sender data as it goes on the wire, at most 32 bytes
    pub fn sender_data(&self) -> &[u8] {
        let len = self.sender_data.len().min(field_size::MAX_SENDER_DATA);
        &self.sender_data[..len]
    }

    fn write_to(&self, vbytes: &mut Vec<u8>, for_signing: bool) {
        vbytes.extend(&self.amount.to_be_bytes());
        vbytes.extend(self.receiver_identifier.as_bytes());
        if for_signing {
            vbytes.extend(&self.previous_block_hash);
        } else {
            vbytes.extend(&mask_height(self.previous_hash_height).to_be_bytes());
        }
        vbytes.extend(self.sender_identifier.as_bytes());
        if for_signing {
            vbytes.extend(&double_sha256(self.sender_data()));
        } else {
            let sender_data = self.sender_data();
            vbytes.push(sender_data.len() as u8);
            vbytes.extend(sender_data);
            vbytes.extend(self.signature.as_bytes());
        }
    }

    fn byte_size(&self, for_signing: bool) -> usize {
        let mut size = field_size::TRANSACTION_AMOUNT + field_size::IDENTIFIER;
        if for_signing {
            size += field_size::HASH + field_size::IDENTIFIER + field_size::HASH;
        } else {
            size += field_size::BLOCK_HEIGHT
                + field_size::IDENTIFIER
                + 1
                + self.sender_data().len()
                + field_size::SIGNATURE;
        }
        size
    }
}

/// One verifier's vote on a cycle transaction.
///
/// Stands alone as a type-4 transaction, or sits inside a version-2 Cycle
/// transaction's signature list, where the `cycle_transaction_signature` is
/// not transmitted and is taken from the enclosing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSignatureTransaction {
    pub timestamp: u64,
    pub sender_identifier: Identifier,
    pub vote: bool,
    pub cycle_transaction_signature: Signature,
    pub signature: Signature,
}

impl CycleSignatureTransaction {
    fn decode_standalone(reader: &mut ByteReader<'_>, timestamp: u64) -> Result<Self> {
        let sender_identifier = Identifier(reader.read_array("cycle signature sender")?);
        let vote = reader.read_bool("cycle signature vote")?;
        let cycle_transaction_signature =
            Signature(reader.read_array("cycle transaction signature")?);
        let signature = Signature(reader.read_array("cycle signature signature")?);
        Ok(CycleSignatureTransaction {
            timestamp,
            sender_identifier,
            vote,
            cycle_transaction_signature,
            signature,
        })
    }

    fn decode_child(reader: &mut ByteReader<'_>, parent_signature: &Signature) -> Result<Self> {
        let timestamp = reader.read_u64("child cycle signature timestamp")?;
        let sender_identifier = Identifier(reader.read_array("child cycle signature sender")?);
        let vote = reader.read_bool("child cycle signature vote")?;
        let signature = Signature(reader.read_array("child cycle signature")?);
        Ok(CycleSignatureTransaction {
            timestamp,
            sender_identifier,
            vote,
            cycle_transaction_signature: *parent_signature,
            signature,
        })
    }

    fn write_standalone(&self, vbytes: &mut Vec<u8>, for_signing: bool) {
        vbytes.extend(self.sender_identifier.as_bytes());
        vbytes.push(self.vote_byte());
        vbytes.extend(self.cycle_transaction_signature.as_bytes());
        if !for_signing {
            vbytes.extend(self.signature.as_bytes());
        }
    }

    fn write_child(&self, vbytes: &mut Vec<u8>) {
        vbytes.extend(&self.timestamp.to_be_bytes());
        vbytes.extend(self.sender_identifier.as_bytes());
        vbytes.push(self.vote_byte());
        vbytes.extend(self.signature.as_bytes());
    }

    fn vote_byte(&self) -> u8 {
        u8::from(self.vote)
    }

    /// `cycle_transaction_signature || ':' || vote`, the sender data a
    /// child vote is accounted under when its digest is recomputed
    pub fn synthetic_sender_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(field_size::SIGNATURE + 2);
        data.extend(self.cycle_transaction_signature.as_bytes());
        data.push(b':');
        data.push(self.vote_byte());
        data
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSignaturePair {
    pub identifier: Identifier,
    pub signature: Signature,
}

/// Co-signatures trailing a Cycle transaction; exactly one layout is in use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleSignatures {
    Pairs(Vec<CycleSignaturePair>),
    Transactions(Vec<CycleSignatureTransaction>),
}

impl CycleSignatures {
    fn decode(
        reader: &mut ByteReader<'_>,
        layout: CycleSignatureLayout,
        transfer: &Transfer,
    ) -> Result<CycleSignatures> {
        let count = reader.read_u32("cycle signature count")? as usize;
        match layout {
            CycleSignatureLayout::Pairs => {
                let mut pairs =
                    Vec::with_capacity(reader.capacity_hint(count, CYCLE_SIGNATURE_PAIR_SIZE));
                for _ in 0..count {
                    let identifier = Identifier(reader.read_array("cycle signer identifier")?);
                    let signature = Signature(reader.read_array("cycle signer signature")?);
                    // the initiator's own signature is the transaction signature
                    if identifier != transfer.sender_identifier {
                        pairs.push(CycleSignaturePair {
                            identifier,
                            signature,
                        });
                    }
                }
                Ok(CycleSignatures::Pairs(pairs))
            }
            CycleSignatureLayout::Transactions => {
                let mut children =
                    Vec::with_capacity(reader.capacity_hint(count, CYCLE_SIGNATURE_CHILD_SIZE));
                for _ in 0..count {
                    children.push(CycleSignatureTransaction::decode_child(
                        reader,
                        &transfer.signature,
                    )?);
                }
                Ok(CycleSignatures::Transactions(children))
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CycleSignatures::Pairs(pairs) => pairs.len(),
            CycleSignatures::Transactions(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn layout(&self) -> CycleSignatureLayout {
        match self {
            CycleSignatures::Pairs(_) => CycleSignatureLayout::Pairs,
            CycleSignatures::Transactions(_) => CycleSignatureLayout::Transactions,
        }
    }

    /// An empty list reads the same in either layout
    pub fn fits(&self, layout: CycleSignatureLayout) -> bool {
        self.is_empty() || self.layout() == layout
    }

    // Entries always go out sorted ascending by signer identifier. A list that
    // does not fit `layout` is written as empty so the stream stays decodable.
    fn write_to(&self, vbytes: &mut Vec<u8>, layout: CycleSignatureLayout) {
        if !self.fits(layout) {
            warn!(
                "{} cycle signatures cannot be written as {layout:?}, writing none",
                self.len()
            );
            vbytes.extend(&0u32.to_be_bytes());
            return;
        }
        vbytes.extend(&(self.len() as u32).to_be_bytes());
        match self {
            CycleSignatures::Pairs(pairs) => {
                let mut sorted: Vec<&CycleSignaturePair> = pairs.iter().collect();
                sorted.sort_by(|a, b| a.identifier.cmp(&b.identifier));
                for pair in sorted {
                    vbytes.extend(pair.identifier.as_bytes());
                    vbytes.extend(pair.signature.as_bytes());
                }
            }
            CycleSignatures::Transactions(children) => {
                let mut sorted: Vec<&CycleSignatureTransaction> = children.iter().collect();
                sorted.sort_by(|a, b| a.sender_identifier.cmp(&b.sender_identifier));
                for child in sorted {
                    child.write_child(vbytes);
                }
            }
        }
    }

    fn byte_size(&self, layout: CycleSignatureLayout) -> usize {
        if !self.fits(layout) {
            return field_size::UNNAMED_INTEGER;
        }
        let entry_size = match self {
            CycleSignatures::Pairs(_) => CYCLE_SIGNATURE_PAIR_SIZE,
            CycleSignatures::Transactions(_) => CYCLE_SIGNATURE_CHILD_SIZE,
        };
        field_size::UNNAMED_INTEGER + entry_size * self.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transaction {
    CoinGeneration {
        timestamp: u64,
        amount: u64,
        receiver_identifier: Identifier,
    },
    Seed(Transfer),
    Standard(Transfer),
    Cycle {
        transfer: Transfer,
        cycle_signatures: CycleSignatures,
    },
    CycleSignature(CycleSignatureTransaction),
}

impl Transaction {
    /// Decode one transaction from the start of `bytes`.
    ///
    /// Returns the transaction and the number of bytes it occupied. An unknown
    /// type tag fails the whole decode: the length of the unknown body cannot be
    /// known, so nothing after it can be trusted.
    pub fn decode(bytes: &[u8], layout: CycleSignatureLayout) -> Result<(Transaction, usize)> {
        let mut reader = ByteReader::new(bytes);
        let transaction_type = TransactionType::try_from(reader.read_u8("transaction type")?)?;
        let timestamp = reader.read_u64("transaction timestamp")?;

        let transaction = match transaction_type {
            TransactionType::CoinGeneration => Transaction::CoinGeneration {
                timestamp,
                amount: reader.read_u64("amount")?,
                receiver_identifier: Identifier(reader.read_array("receiver identifier")?),
            },
            TransactionType::Seed => Transaction::Seed(Transfer::decode(&mut reader, timestamp)?),
            TransactionType::Standard => {
                Transaction::Standard(Transfer::decode(&mut reader, timestamp)?)
            }
            TransactionType::Cycle => {
                let transfer = Transfer::decode(&mut reader, timestamp)?;
                let cycle_signatures = CycleSignatures::decode(&mut reader, layout, &transfer)?;
                Transaction::Cycle {
                    transfer,
                    cycle_signatures,
                }
            }
            TransactionType::CycleSignature => Transaction::CycleSignature(
                CycleSignatureTransaction::decode_standalone(&mut reader, timestamp)?,
            ),
        };

        debug!(
            "Decoded {:?} transaction at {timestamp}, {} bytes",
            transaction_type,
            reader.offset()
        );
        Ok((transaction, reader.offset()))
    }

    /// Decode a transaction at the reader's position and advance past it.
    pub fn read_from(reader: &mut ByteReader<'_>, layout: CycleSignatureLayout) -> Result<Self> {
        reader.decode_with(|tail| Transaction::decode(tail, layout))
    }

    /// `layout` is the one implied by the version of the enclosing block or
    /// balance list; it only matters for the wire form of Cycle transactions.
    pub fn encode(&self, for_signing: bool, layout: CycleSignatureLayout) -> Vec<u8> {
        let mut vbytes = Vec::with_capacity(self.byte_size(for_signing, layout));
        self.write_to(&mut vbytes, for_signing, layout);
        vbytes
    }

    pub fn write_to(&self, vbytes: &mut Vec<u8>, for_signing: bool, layout: CycleSignatureLayout) {
        vbytes.push(self.transaction_type() as u8);
        vbytes.extend(&self.timestamp().to_be_bytes());
        match self {
            Transaction::CoinGeneration {
                amount,
                receiver_identifier,
                ..
            } => {
                vbytes.extend(&amount.to_be_bytes());
                vbytes.extend(receiver_identifier.as_bytes());
            }
            Transaction::Seed(transfer) | Transaction::Standard(transfer) => {
                transfer.write_to(vbytes, for_signing);
            }
            Transaction::Cycle {
                transfer,
                cycle_signatures,
            } => {
                transfer.write_to(vbytes, for_signing);
                if !for_signing {
                    cycle_signatures.write_to(vbytes, layout);
                }
            }
            Transaction::CycleSignature(cycle_signature) => {
                cycle_signature.write_standalone(vbytes, for_signing);
            }
        }
    }

    /// Computed from the fields alone; always equals `encode(for_signing, layout).len()`
    pub fn byte_size(&self, for_signing: bool, layout: CycleSignatureLayout) -> usize {
        let header = field_size::TRANSACTION_TYPE + field_size::TIMESTAMP;
        let body = match self {
            Transaction::CoinGeneration { .. } => {
                field_size::TRANSACTION_AMOUNT + field_size::IDENTIFIER
            }
            Transaction::Seed(transfer) | Transaction::Standard(transfer) => {
                transfer.byte_size(for_signing)
            }
            Transaction::Cycle {
                transfer,
                cycle_signatures,
            } => {
                let mut size = transfer.byte_size(for_signing);
                if !for_signing {
                    size += cycle_signatures.byte_size(layout);
                }
                size
            }
            Transaction::CycleSignature(_) => {
                let mut size =
                    field_size::IDENTIFIER + field_size::BOOLEAN_FIELD + field_size::SIGNATURE;
                if !for_signing {
                    size += field_size::SIGNATURE;
                }
                size
            }
        };
        header + body
    }

    /// Fails for a Cycle transaction whose signature list cannot be written in `layout`.
    pub fn check_layout(&self, layout: CycleSignatureLayout) -> Result<()> {
        match self {
            Transaction::Cycle {
                cycle_signatures, ..
            } if !cycle_signatures.fits(layout) => Err(NyzoError::LayoutMismatch(format!(
                "cycle transaction at {} carries {:?} signatures, {layout:?} required",
                self.timestamp(),
                cycle_signatures.layout()
            ))),
            _ => Ok(()),
        }
    }

    // the signing form stops before any signature list, so the layout is moot
    fn signing_bytes(&self) -> Vec<u8> {
        self.encode(true, CycleSignatureLayout::Pairs)
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Transaction::CoinGeneration { .. } => TransactionType::CoinGeneration,
            Transaction::Seed(_) => TransactionType::Seed,
            Transaction::Standard(_) => TransactionType::Standard,
            Transaction::Cycle { .. } => TransactionType::Cycle,
            Transaction::CycleSignature(_) => TransactionType::CycleSignature,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Transaction::CoinGeneration { timestamp, .. } => *timestamp,
            Transaction::Seed(transfer) | Transaction::Standard(transfer) => transfer.timestamp,
            Transaction::Cycle { transfer, .. } => transfer.timestamp,
            Transaction::CycleSignature(cycle_signature) => cycle_signature.timestamp,
        }
    }

    /// Micronyzos moved; a cycle signature moves nothing
    pub fn amount(&self) -> u64 {
        match self {
            Transaction::CoinGeneration { amount, .. } => *amount,
            Transaction::Seed(transfer) | Transaction::Standard(transfer) => transfer.amount,
            Transaction::Cycle { transfer, .. } => transfer.amount,
            Transaction::CycleSignature(_) => 0,
        }
    }

    /// One micronyzo per started 400, nothing for cycle transactions and votes
    pub fn fee(&self) -> u64 {
        match self {
            Transaction::Cycle { .. } | Transaction::CycleSignature(_) => 0,
            _ => {
                let amount = self.amount();
                amount / FEE_DIVISOR + u64::from(amount % FEE_DIVISOR != 0)
            }
        }
    }

    pub fn amount_after_fee(&self) -> u64 {
        self.amount() - self.fee()
    }

    pub fn sender_identifier(&self) -> Option<&Identifier> {
        match self {
            Transaction::CoinGeneration { .. } => None,
            Transaction::Seed(transfer) | Transaction::Standard(transfer) => {
                Some(&transfer.sender_identifier)
            }
            Transaction::Cycle { transfer, .. } => Some(&transfer.sender_identifier),
            Transaction::CycleSignature(cycle_signature) => {
                Some(&cycle_signature.sender_identifier)
            }
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Transaction::CoinGeneration { .. } => None,
            Transaction::Seed(transfer) | Transaction::Standard(transfer) => {
                Some(&transfer.signature)
            }
            Transaction::Cycle { transfer, .. } => Some(&transfer.signature),
            Transaction::CycleSignature(cycle_signature) => Some(&cycle_signature.signature),
        }
    }

    /// Height of the block whose hash a transfer is signed against
    pub fn previous_hash_height(&self) -> Option<u64> {
        self.transfer().map(|transfer| transfer.previous_hash_height)
    }

    fn transfer(&self) -> Option<&Transfer> {
        match self {
            Transaction::Seed(transfer)
            | Transaction::Standard(transfer)
            | Transaction::Cycle { transfer, .. } => Some(transfer),
            _ => None,
        }
    }

    fn transfer_mut(&mut self) -> Option<&mut Transfer> {
        match self {
            Transaction::Seed(transfer)
            | Transaction::Standard(transfer)
            | Transaction::Cycle { transfer, .. } => Some(transfer),
            _ => None,
        }
    }

    fn signer_fields(&mut self) -> Option<(&mut Identifier, &mut Signature)> {
        match self {
            Transaction::CoinGeneration { .. } => None,
            Transaction::Seed(transfer)
            | Transaction::Standard(transfer)
            | Transaction::Cycle { transfer, .. } => {
                Some((&mut transfer.sender_identifier, &mut transfer.signature))
            }
            Transaction::CycleSignature(cycle_signature) => Some((
                &mut cycle_signature.sender_identifier,
                &mut cycle_signature.signature,
            )),
        }
    }

    /// Make `key_pair` the sender and sign the signing form.
    /// Coin generation transactions carry no signature and are left untouched.
    pub fn sign(&mut self, key_pair: &KeyPair) {
        match self.signer_fields() {
            Some((sender, _)) => *sender = key_pair.identifier(),
            None => return,
        }
        let signature = key_pair.sign(&self.signing_bytes());
        if let Some((_, slot)) = self.signer_fields() {
            *slot = signature;
        }
    }

    /// Check the sender's signature.
    ///
    /// Transfers are signed over the hash of the block at `previous_hash_height`,
    /// which never travels with them; the caller resolves it and passes it in.
    /// Other kinds ignore `previous_block_hash`.
    pub fn signature_is_valid(&self, previous_block_hash: &[u8; field_size::HASH]) -> bool {
        let (sender, signature) = match (self.sender_identifier(), self.signature()) {
            (Some(sender), Some(signature)) => (sender, signature),
            _ => return true,
        };
        let mut resolved = self.clone();
        if let Some(transfer) = resolved.transfer_mut() {
            transfer.previous_block_hash = *previous_block_hash;
        }
        verify_signature(signature, &resolved.signing_bytes(), sender)
    }

    /// Build and sign a standard transfer from `key_pair` to `receiver_identifier`.
    pub fn standard(
        amount: u64,
        receiver_identifier: Identifier,
        previous_hash_height: u64,
        previous_block_hash: [u8; field_size::HASH],
        sender_data: &[u8],
        key_pair: &KeyPair,
    ) -> Result<Transaction> {
        let sender_data = &sender_data[..sender_data.len().min(field_size::MAX_SENDER_DATA)];
        let mut transaction = Transaction::Standard(Transfer {
            timestamp: current_timestamp()?,
            amount,
            receiver_identifier,
            previous_hash_height: mask_height(previous_hash_height),
            previous_block_hash,
            sender_identifier: key_pair.identifier(),
            sender_data: sender_data.to_vec(),
            signature: Signature::default(),
        });
        transaction.sign(key_pair);
        Ok(transaction)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: CycleSignatureLayout = CycleSignatureLayout::Pairs;
    const TRANSACTIONS: CycleSignatureLayout = CycleSignatureLayout::Transactions;

    fn identifier(byte: u8) -> Identifier {
        Identifier([byte; 32])
    }

    fn signature(byte: u8) -> Signature {
        Signature([byte; 64])
    }

    fn transfer(sender: u8) -> Transfer {
        Transfer {
            timestamp: 1_600_000_000_000,
            amount: 1_000_000,
            receiver_identifier: identifier(0x22),
            previous_hash_height: 12_345,
            previous_block_hash: [0u8; 32],
            sender_identifier: identifier(sender),
            sender_data: b"memo".to_vec(),
            signature: signature(0x55),
        }
    }

    fn assert_wire_round_trip(transaction: &Transaction, layout: CycleSignatureLayout) {
        let bytes = transaction.encode(false, layout);
        assert_eq!(transaction.byte_size(false, layout), bytes.len());
        assert_eq!(transaction.byte_size(true, layout), transaction.encode(true, layout).len());
        let (decoded, consumed) = Transaction::decode(&bytes, layout).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(&decoded, transaction);
    }

    #[test]
    fn test_fee_rounds_up() {
        let transaction = Transaction::Standard(transfer(0x11));
        assert_eq!(transaction.fee(), 2500);
        assert_eq!(transaction.amount_after_fee(), 997_500);

        let mut odd = transfer(0x11);
        odd.amount = 401;
        assert_eq!(Transaction::Seed(odd).fee(), 2);

        let cycle = Transaction::Cycle {
            transfer: transfer(0x11),
            cycle_signatures: CycleSignatures::Pairs(vec![]),
        };
        assert_eq!(cycle.fee(), 0);
    }

    #[test]
    fn test_fee_does_not_overflow_near_max() {
        let transaction = Transaction::CoinGeneration {
            timestamp: 0,
            amount: u64::MAX,
            receiver_identifier: identifier(1),
        };
        assert_eq!(transaction.fee(), u64::MAX / 400 + 1);
    }

    #[test]
    fn test_round_trip_every_variant() {
        let coin_generation = Transaction::CoinGeneration {
            timestamp: 7,
            amount: 100_000_000,
            receiver_identifier: identifier(0x01),
        };
        assert_wire_round_trip(&coin_generation, CycleSignatureLayout::Pairs);
        assert_eq!(coin_generation.encode(false, PAIRS).len(), 1 + 8 + 8 + 32);

        assert_wire_round_trip(
            &Transaction::Seed(transfer(0x11)),
            CycleSignatureLayout::Pairs,
        );
        assert_wire_round_trip(
            &Transaction::Standard(transfer(0x11)),
            CycleSignatureLayout::Pairs,
        );

        let v1_cycle = Transaction::Cycle {
            transfer: transfer(0x11),
            cycle_signatures: CycleSignatures::Pairs(vec![
                CycleSignaturePair {
                    identifier: identifier(0x03),
                    signature: signature(0x30),
                },
                CycleSignaturePair {
                    identifier: identifier(0x04),
                    signature: signature(0x40),
                },
            ]),
        };
        assert_wire_round_trip(&v1_cycle, CycleSignatureLayout::Pairs);

        let parent = transfer(0x11);
        let v2_cycle = Transaction::Cycle {
            cycle_signatures: CycleSignatures::Transactions(vec![CycleSignatureTransaction {
                timestamp: 99,
                sender_identifier: identifier(0x05),
                vote: true,
                cycle_transaction_signature: parent.signature,
                signature: signature(0x50),
            }]),
            transfer: parent,
        };
        assert_wire_round_trip(&v2_cycle, CycleSignatureLayout::Transactions);

        let vote = Transaction::CycleSignature(CycleSignatureTransaction {
            timestamp: 3,
            sender_identifier: identifier(0x06),
            vote: false,
            cycle_transaction_signature: signature(0x60),
            signature: signature(0x61),
        });
        assert_wire_round_trip(&vote, CycleSignatureLayout::Pairs);
        assert_eq!(vote.encode(false, PAIRS).len(), 1 + 8 + 32 + 1 + 64 + 64);
        assert_eq!(vote.encode(true, PAIRS).len(), 1 + 8 + 32 + 1 + 64);
    }

    #[test]
    fn test_signing_form_substitutes_hashes() {
        let mut with_hash = transfer(0x11);
        with_hash.previous_block_hash = [0xee; 32];
        let transaction = Transaction::Standard(with_hash);
        let signing = transaction.encode(true, PAIRS);
        assert_eq!(signing.len(), 1 + 8 + 8 + 32 + 32 + 32 + 32);
        assert_eq!(&signing[49..81], &[0xee; 32]);
        assert_eq!(&signing[113..145], &double_sha256(b"memo"));
    }

    #[test]
    fn test_cycle_signing_form_omits_signature_list() {
        let standard = Transaction::Standard(transfer(0x11));
        let cycle = Transaction::Cycle {
            transfer: transfer(0x11),
            cycle_signatures: CycleSignatures::Pairs(vec![CycleSignaturePair {
                identifier: identifier(0x03),
                signature: signature(0x30),
            }]),
        };
        assert_eq!(cycle.byte_size(true, PAIRS), standard.byte_size(true, PAIRS));
        assert_eq!(&cycle.encode(true, PAIRS)[1..], &standard.encode(true, PAIRS)[1..]);
    }

    #[test]
    fn test_cycle_pairs_are_emitted_sorted() {
        let cycle = Transaction::Cycle {
            transfer: transfer(0x11),
            cycle_signatures: CycleSignatures::Pairs(vec![
                CycleSignaturePair {
                    identifier: identifier(0x09),
                    signature: signature(0x90),
                },
                CycleSignaturePair {
                    identifier: identifier(0x02),
                    signature: signature(0x20),
                },
                CycleSignaturePair {
                    identifier: identifier(0x05),
                    signature: signature(0x50),
                },
            ]),
        };
        let bytes = cycle.encode(false, PAIRS);
        let list_start = Transaction::Standard(transfer(0x11)).byte_size(false, PAIRS);
        assert_eq!(&bytes[list_start..list_start + 4], &[0, 0, 0, 3]);
        let first_ids: Vec<u8> = (0..3)
            .map(|i| bytes[list_start + 4 + i * CYCLE_SIGNATURE_PAIR_SIZE])
            .collect();
        assert_eq!(first_ids, vec![0x02, 0x05, 0x09]);
    }

    #[test]
    fn test_decode_drops_initiator_self_signature() {
        let cycle = Transaction::Cycle {
            transfer: transfer(0x11),
            cycle_signatures: CycleSignatures::Pairs(vec![
                CycleSignaturePair {
                    identifier: identifier(0x11),
                    signature: signature(0x55),
                },
                CycleSignaturePair {
                    identifier: identifier(0x12),
                    signature: signature(0x66),
                },
            ]),
        };
        let bytes = cycle.encode(false, PAIRS);
        let (decoded, consumed) = Transaction::decode(&bytes, CycleSignatureLayout::Pairs).unwrap();
        assert_eq!(consumed, bytes.len());
        match decoded {
            Transaction::Cycle {
                cycle_signatures: CycleSignatures::Pairs(pairs),
                ..
            } => {
                assert_eq!(pairs.len(), 1);
                assert_eq!(pairs[0].identifier, identifier(0x12));
            }
            other => panic!("unexpected transaction {other:?}"),
        }
    }

    #[test]
    fn test_child_votes_inherit_parent_signature() {
        let parent = transfer(0x11);
        let mut child = CycleSignatureTransaction {
            timestamp: 1,
            sender_identifier: identifier(0x07),
            vote: true,
            cycle_transaction_signature: signature(0x00),
            signature: signature(0x70),
        };
        let cycle = Transaction::Cycle {
            transfer: parent.clone(),
            cycle_signatures: CycleSignatures::Transactions(vec![child.clone()]),
        };
        let bytes = cycle.encode(false, TRANSACTIONS);
        let (decoded, _) = Transaction::decode(&bytes, TRANSACTIONS).unwrap();

        child.cycle_transaction_signature = parent.signature;
        match decoded {
            Transaction::Cycle {
                cycle_signatures: CycleSignatures::Transactions(children),
                ..
            } => {
                assert_eq!(children, vec![child.clone()]);
                let synthetic = children[0].synthetic_sender_data();
                assert_eq!(synthetic.len(), 66);
                assert_eq!(&synthetic[..64], parent.signature.as_bytes());
                assert_eq!(&synthetic[64..], &[b':', 1]);
            }
            other => panic!("unexpected transaction {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut bytes = Transaction::Standard(transfer(0x11)).encode(false, PAIRS);
        bytes[0] = 9;
        let err = Transaction::decode(&bytes, CycleSignatureLayout::Pairs).unwrap_err();
        assert_eq!(err, NyzoError::UnknownTransactionType(9));
    }

    #[test]
    fn test_truncated_transaction_is_malformed() {
        let bytes = Transaction::Standard(transfer(0x11)).encode(false, PAIRS);
        let err = Transaction::decode(&bytes[..bytes.len() - 1], CycleSignatureLayout::Pairs)
            .unwrap_err();
        assert!(matches!(err, NyzoError::MalformedBuffer(_)));
    }

    #[test]
    fn test_sender_data_length_is_clamped() {
        let mut long = transfer(0x11);
        long.sender_data = vec![0xaa; 32];
        let mut bytes = Transaction::Standard(long).encode(false, PAIRS);
        // sender data length byte sits after type, timestamp, amount, receiver, height, sender
        let length_at = 1 + 8 + 8 + 32 + 8 + 32;
        assert_eq!(bytes[length_at], 32);
        bytes[length_at] = 40;
        let (decoded, consumed) = Transaction::decode(&bytes, CycleSignatureLayout::Pairs).unwrap();
        assert_eq!(consumed, bytes.len());
        match decoded {
            Transaction::Standard(transfer) => assert_eq!(transfer.sender_data.len(), 32),
            other => panic!("unexpected transaction {other:?}"),
        }
    }

    #[test]
    fn test_standard_builder_signs() {
        let key_pair = KeyPair::from_seed(&[7u8; 32]).unwrap();
        let transaction =
            Transaction::standard(5_000, identifier(0x22), 10, [1u8; 32], b"hi", &key_pair)
                .unwrap();
        assert_eq!(transaction.sender_identifier(), Some(&key_pair.identifier()));
        assert!(transaction.signature_is_valid(&[1u8; 32]));
        assert!(!transaction.signature_is_valid(&[2u8; 32]));

        let mut tampered = transaction.clone();
        if let Transaction::Standard(transfer) = &mut tampered {
            transfer.amount += 1;
        }
        assert!(!tampered.signature_is_valid(&[1u8; 32]));
    }

    #[test]
    fn test_decoded_transfer_verifies_against_resolved_hash() {
        let key_pair = KeyPair::from_seed(&[7u8; 32]).unwrap();
        let previous_block_hash = [0x3c; 32];
        let transaction = Transaction::standard(
            5_000,
            identifier(0x22),
            10,
            previous_block_hash,
            b"hi",
            &key_pair,
        )
        .unwrap();

        let bytes = transaction.encode(false, PAIRS);
        let (decoded, _) = Transaction::decode(&bytes, PAIRS).unwrap();
        assert_eq!(decoded.previous_hash_height(), Some(10));
        assert!(decoded.signature_is_valid(&previous_block_hash));
        assert!(!decoded.signature_is_valid(&[0u8; 32]));
    }

    #[test]
    fn test_list_outside_its_layout_is_written_empty() {
        let pairs = Transaction::Cycle {
            transfer: transfer(0x11),
            cycle_signatures: CycleSignatures::Pairs(vec![CycleSignaturePair {
                identifier: identifier(0x03),
                signature: signature(0x30),
            }]),
        };
        assert!(pairs.check_layout(PAIRS).is_ok());
        assert!(matches!(
            pairs.check_layout(TRANSACTIONS),
            Err(NyzoError::LayoutMismatch(_))
        ));

        let bytes = pairs.encode(false, TRANSACTIONS);
        assert_eq!(pairs.byte_size(false, TRANSACTIONS), bytes.len());
        let (decoded, consumed) = Transaction::decode(&bytes, TRANSACTIONS).unwrap();
        assert_eq!(consumed, bytes.len());
        match decoded {
            Transaction::Cycle {
                cycle_signatures, ..
            } => assert!(cycle_signatures.is_empty()),
            other => panic!("unexpected transaction {other:?}"),
        }

        let empty = Transaction::Cycle {
            transfer: transfer(0x11),
            cycle_signatures: CycleSignatures::Pairs(vec![]),
        };
        assert!(empty.check_layout(TRANSACTIONS).is_ok());
    }

    #[test]
    fn test_json_view_uses_hex() {
        let json = Transaction::Standard(transfer(0x11)).to_json().unwrap();
        assert!(json.contains("\"type\":\"standard\""));
        assert!(json.contains(&"22".repeat(32)));
        assert!(json.contains("\"sender_data\":\"6d656d6f\""));
    }
}
