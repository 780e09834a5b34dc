use crate::core::field_size;
use crate::error::Result;
use crate::utils::{string_byte_size, write_string, ByteReader};
use serde::Serialize;

/// A peer's verdict on a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResponse {
    accepted: bool,
    message: String,
}

impl TransactionResponse {
    pub fn new(accepted: bool, message: &str) -> Self {
        TransactionResponse {
            accepted,
            message: message.to_string(),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<TransactionResponse> {
        let mut reader = ByteReader::new(bytes);
        Ok(TransactionResponse {
            accepted: reader.read_bool("transaction accepted")?,
            message: reader.read_string("transaction response message")?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut vbytes = Vec::with_capacity(self.byte_size());
        vbytes.push(u8::from(self.accepted));
        write_string(&mut vbytes, &self.message);
        vbytes
    }

    pub fn byte_size(&self) -> usize {
        field_size::BOOLEAN_FIELD + string_byte_size(&self.message)
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }
}
