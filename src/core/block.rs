use crate::core::field_size;
use crate::core::transaction::{CycleSignatureLayout, Transaction};
use crate::core::types::{pack_height_and_version, unpack_height_and_version, Identifier, Signature};
use crate::error::Result;
use crate::utils::{current_timestamp, double_sha256, serialize_hex, ByteReader};
use crate::wallet::{verify_signature, KeyPair};
use log::{debug, info};
use serde::Serialize;
use std::fmt;

// packed height(8) previous hash(32) start(8) verification(8)
// transaction count(4) balance list hash(32)
const UNSIGNED_FIXED_SIZE: usize = field_size::BLOCK_HEIGHT
    + field_size::HASH
    + field_size::TIMESTAMP
    + field_size::TIMESTAMP
    + field_size::UNNAMED_INTEGER
    + field_size::HASH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    blockchain_version: u16,
    height: u64,
    #[serde(serialize_with = "serialize_hex")]
    previous_block_hash: [u8; field_size::HASH], // double SHA-256 of the previous block's signature
    start_timestamp: u64,
    verification_timestamp: u64,
    transactions: Vec<Transaction>,
    #[serde(serialize_with = "serialize_hex")]
    balance_list_hash: [u8; field_size::HASH],
    verifier_identifier: Identifier,
    verifier_signature: Signature,
}

impl Block {
    /// Assemble a block and sign it as `key_pair`; the verification timestamp is now.
    pub fn new_block(
        blockchain_version: u16,
        height: u64,
        previous_block_hash: [u8; field_size::HASH],
        start_timestamp: u64,
        transactions: &[Transaction],
        balance_list_hash: [u8; field_size::HASH],
        key_pair: &KeyPair,
    ) -> Result<Block> {
        let layout = CycleSignatureLayout::for_version(blockchain_version);
        for transaction in transactions {
            transaction.check_layout(layout)?;
        }
        let mut block = Block {
            blockchain_version,
            height,
            previous_block_hash,
            start_timestamp,
            verification_timestamp: current_timestamp()?,
            transactions: transactions.to_vec(),
            balance_list_hash,
            verifier_identifier: key_pair.identifier(),
            verifier_signature: Signature::default(),
        };
        block.verifier_signature = key_pair.sign(&block.encode(false));
        info!("Signed block {height} as {}", block.verifier_identifier);
        Ok(block)
    }

    /// Decode a signed block from the start of `bytes`; returns it with the
    /// number of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> Result<(Block, usize)> {
        let mut reader = ByteReader::new(bytes);
        let (blockchain_version, height) =
            unpack_height_and_version(reader.read_u64("block height")?);
        let previous_block_hash = reader.read_array("previous block hash")?;
        let start_timestamp = reader.read_u64("start timestamp")?;
        let verification_timestamp = reader.read_u64("verification timestamp")?;

        // the block version decides how embedded cycle signatures are laid out
        let layout = CycleSignatureLayout::for_version(blockchain_version);
        let transaction_count = reader.read_u32("transaction count")? as usize;
        let mut transactions = vec![];
        for _ in 0..transaction_count {
            transactions.push(Transaction::read_from(&mut reader, layout)?);
        }

        let balance_list_hash = reader.read_array("balance list hash")?;
        let verifier_identifier = Identifier(reader.read_array("verifier identifier")?);
        let verifier_signature = Signature(reader.read_array("verifier signature")?);

        debug!(
            "Decoded block {height} v{blockchain_version}: {transaction_count} txs, {} bytes",
            reader.offset()
        );

        let block = Block {
            blockchain_version,
            height,
            previous_block_hash,
            start_timestamp,
            verification_timestamp,
            transactions,
            balance_list_hash,
            verifier_identifier,
            verifier_signature,
        };
        Ok((block, reader.offset()))
    }

    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        reader.decode_with(Block::decode)
    }

    /// The unsigned form ends after the balance list hash; it is what the verifier signs.
    pub fn encode(&self, include_signature: bool) -> Vec<u8> {
        let mut vbytes = Vec::with_capacity(self.byte_size(include_signature));
        self.write_to(&mut vbytes, include_signature);
        vbytes
    }

    pub fn write_to(&self, vbytes: &mut Vec<u8>, include_signature: bool) {
        let layout = self.cycle_signature_layout();
        vbytes.extend(&pack_height_and_version(self.blockchain_version, self.height).to_be_bytes());
        vbytes.extend(&self.previous_block_hash);
        vbytes.extend(&self.start_timestamp.to_be_bytes());
        vbytes.extend(&self.verification_timestamp.to_be_bytes());
        vbytes.extend(&(self.transactions.len() as u32).to_be_bytes());
        for transaction in &self.transactions {
            transaction.write_to(vbytes, false, layout);
        }
        vbytes.extend(&self.balance_list_hash);
        if include_signature {
            vbytes.extend(self.verifier_identifier.as_bytes());
            vbytes.extend(self.verifier_signature.as_bytes());
        }
    }

    pub fn byte_size(&self, include_signature: bool) -> usize {
        let layout = self.cycle_signature_layout();
        let mut size = UNSIGNED_FIXED_SIZE;
        size += self
            .transactions
            .iter()
            .map(|transaction| transaction.byte_size(false, layout))
            .sum::<usize>();
        if include_signature {
            size += field_size::IDENTIFIER + field_size::SIGNATURE;
        }
        size
    }

    fn cycle_signature_layout(&self) -> CycleSignatureLayout {
        CycleSignatureLayout::for_version(self.blockchain_version)
    }

    /// Double SHA-256 of the verifier signature; the next block's previous hash
    pub fn hash(&self) -> [u8; field_size::HASH] {
        double_sha256(self.verifier_signature.as_bytes())
    }

    pub fn signature_is_valid(&self) -> bool {
        verify_signature(
            &self.verifier_signature,
            &self.encode(false),
            &self.verifier_identifier,
        )
    }

    pub fn get_blockchain_version(&self) -> u16 {
        self.blockchain_version
    }

    pub fn get_height(&self) -> u64 {
        self.height
    }

    pub fn get_previous_block_hash(&self) -> &[u8; field_size::HASH] {
        &self.previous_block_hash
    }

    pub fn get_start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    pub fn get_verification_timestamp(&self) -> u64 {
        self.verification_timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_balance_list_hash(&self) -> &[u8; field_size::HASH] {
        &self.balance_list_hash
    }

    pub fn get_verifier_identifier(&self) -> &Identifier {
        &self.verifier_identifier
    }

    pub fn get_verifier_signature(&self) -> &Signature {
        &self.verifier_signature
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Block: height={}, transactions={}, hash={}]",
            self.height,
            self.transactions.len(),
            data_encoding::HEXLOWER.encode(&self.hash())
        )
    }
}
