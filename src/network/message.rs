// Envelope layout:
//   timestamp(8) type(2) content(variable) source identifier(32) source signature(64)
// The signing form is the same bytes without the trailing signature.

use crate::core::{field_size, CycleSignatureLayout, Identifier, Signature, Transaction};
use crate::error::{NyzoError, Result};
use crate::network::message_type::MessageType;
use crate::network::messages::{BlockRequest, BlockResponse, StatusResponse, TransactionResponse};
use crate::utils::{current_timestamp, ByteReader};
use crate::wallet::{verify_signature, KeyPair};
use log::{debug, warn};
use serde::Serialize;

const HEADER_SIZE: usize = field_size::TIMESTAMP + field_size::MESSAGE_TYPE;
const TRAILER_SIZE: usize = field_size::IDENTIFIER + field_size::SIGNATURE;
// a transaction carried as message content uses the version 1 signature list
const TRANSACTION_LAYOUT: CycleSignatureLayout = CycleSignatureLayout::Pairs;

/// Typed body of a message; kinds without a codec here carry `Empty`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    Empty,
    Transaction(Transaction),
    TransactionResponse(TransactionResponse),
    BlockRequest(BlockRequest),
    BlockResponse(BlockResponse),
    StatusResponse(StatusResponse),
}

impl MessageContent {
    pub fn decode(message_type: MessageType, bytes: &[u8]) -> Result<MessageContent> {
        let content = match message_type {
            MessageType::Transaction5 => {
                let (transaction, _) = Transaction::decode(bytes, TRANSACTION_LAYOUT)?;
                MessageContent::Transaction(transaction)
            }
            MessageType::TransactionResponse6 => {
                MessageContent::TransactionResponse(TransactionResponse::decode(bytes)?)
            }
            MessageType::BlockRequest11 => {
                MessageContent::BlockRequest(BlockRequest::decode(bytes)?)
            }
            MessageType::BlockResponse12 => {
                MessageContent::BlockResponse(BlockResponse::decode(bytes)?)
            }
            MessageType::StatusResponse18 => {
                MessageContent::StatusResponse(StatusResponse::decode(bytes)?)
            }
            MessageType::StatusRequest17 => MessageContent::Empty,
            other => {
                if !bytes.is_empty() {
                    warn!("No content codec for {other:?}, {} bytes ignored", bytes.len());
                }
                return Ok(MessageContent::Empty);
            }
        };

        // decoded content re-encodes to exactly the bytes it consumed
        let leftover = bytes.len().saturating_sub(content.byte_size());
        if leftover > 0 {
            debug!("{message_type:?} content left {leftover} trailing bytes unread");
        }
        Ok(content)
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            MessageContent::Empty => vec![],
            MessageContent::Transaction(transaction) => {
                transaction.encode(false, TRANSACTION_LAYOUT)
            }
            MessageContent::TransactionResponse(response) => response.encode(),
            MessageContent::BlockRequest(request) => request.encode(),
            MessageContent::BlockResponse(response) => response.encode(),
            MessageContent::StatusResponse(response) => response.encode(),
        }
    }

    pub fn byte_size(&self) -> usize {
        match self {
            MessageContent::Empty => 0,
            MessageContent::Transaction(transaction) => {
                transaction.byte_size(false, TRANSACTION_LAYOUT)
            }
            MessageContent::TransactionResponse(response) => response.byte_size(),
            MessageContent::BlockRequest(_) => BlockRequest::BYTE_SIZE,
            MessageContent::BlockResponse(response) => response.byte_size(),
            MessageContent::StatusResponse(response) => response.byte_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignatureState {
    Undetermined,
    Valid,
    Invalid,
}

/// A signed peer message.
///
/// Messages built locally are signed on construction. Messages decoded from
/// a peer start `Undetermined`; call [`Message::verify_signature`] before
/// acting on their content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    timestamp: u64,
    message_type: MessageType,
    content: MessageContent,
    source_node_identifier: Identifier,
    source_node_signature: Signature,
    signature_state: SignatureState,
    // signing form exactly as received, so content this side cannot re-encode still verifies
    #[serde(skip)]
    received_signing_bytes: Option<Vec<u8>>,
}

impl Message {
    pub fn new(
        message_type: MessageType,
        content: MessageContent,
        key_pair: &KeyPair,
    ) -> Result<Message> {
        if let MessageContent::Transaction(transaction) = &content {
            transaction.check_layout(TRANSACTION_LAYOUT)?;
        }
        let mut message = Message {
            timestamp: current_timestamp()?,
            message_type,
            content,
            source_node_identifier: key_pair.identifier(),
            source_node_signature: Signature::default(),
            signature_state: SignatureState::Valid,
            received_signing_bytes: None,
        };
        message.source_node_signature = key_pair.sign(&message.encode_for_signing());
        Ok(message)
    }

    pub fn encode_for_signing(&self) -> Vec<u8> {
        let mut vbytes =
            Vec::with_capacity(HEADER_SIZE + self.content.byte_size() + field_size::IDENTIFIER);
        vbytes.extend(&self.timestamp.to_be_bytes());
        vbytes.extend(&self.message_type.value().to_be_bytes());
        vbytes.extend(self.content.encode());
        vbytes.extend(self.source_node_identifier.as_bytes());
        vbytes
    }

    pub fn encode_for_transmission(&self) -> Vec<u8> {
        let mut vbytes = self.encode_for_signing();
        vbytes.extend(self.source_node_signature.as_bytes());
        vbytes
    }

    /// Decode a message from a frame payload (the length prefix already removed).
    pub fn decode(bytes: &[u8]) -> Result<Message> {
        if bytes.len() < HEADER_SIZE + TRAILER_SIZE {
            return Err(NyzoError::MalformedBuffer(format!(
                "message of {} bytes is shorter than the {} byte envelope",
                bytes.len(),
                HEADER_SIZE + TRAILER_SIZE
            )));
        }

        let mut reader = ByteReader::new(bytes);
        let timestamp = reader.read_u64("message timestamp")?;
        let message_type = MessageType::try_from(reader.read_u16("message type")?)?;

        let trailer_start = bytes.len() - TRAILER_SIZE;
        let content_bytes = reader.take(trailer_start - HEADER_SIZE, "message content")?;
        let content = MessageContent::decode(message_type, content_bytes)?;

        let source_node_identifier = Identifier(reader.read_array("source node identifier")?);
        let source_node_signature = Signature(reader.read_array("source node signature")?);

        debug!(
            "Decoded {message_type:?} from {source_node_identifier}, {} content bytes",
            content_bytes.len()
        );

        Ok(Message {
            timestamp,
            message_type,
            content,
            source_node_identifier,
            source_node_signature,
            signature_state: SignatureState::Undetermined,
            received_signing_bytes: Some(bytes[..bytes.len() - field_size::SIGNATURE].to_vec()),
        })
    }

    /// Check the source signature once and remember the outcome.
    pub fn verify_signature(&mut self) -> bool {
        if self.signature_state == SignatureState::Undetermined {
            let signed = match &self.received_signing_bytes {
                Some(bytes) => bytes.clone(),
                None => self.encode_for_signing(),
            };
            let valid = verify_signature(
                &self.source_node_signature,
                &signed,
                &self.source_node_identifier,
            );
            self.signature_state = if valid {
                SignatureState::Valid
            } else {
                warn!(
                    "Invalid signature on {:?} from {}",
                    self.message_type, self.source_node_identifier
                );
                SignatureState::Invalid
            };
        }
        self.signature_state == SignatureState::Valid
    }

    pub fn get_timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn get_type(&self) -> MessageType {
        self.message_type
    }

    pub fn get_content(&self) -> &MessageContent {
        &self.content
    }

    pub fn into_content(self) -> MessageContent {
        self.content
    }

    pub fn get_source_node_identifier(&self) -> &Identifier {
        &self.source_node_identifier
    }

    pub fn get_source_node_signature(&self) -> &Signature {
        &self.source_node_signature
    }

    pub fn signature_state(&self) -> SignatureState {
        self.signature_state
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_pair() -> KeyPair {
        KeyPair::from_seed(&[1u8; 32]).unwrap()
    }

    #[test]
    fn test_envelope_layout() {
        let key_pair = key_pair();
        let message = Message::new(
            MessageType::BlockRequest11,
            MessageContent::BlockRequest(BlockRequest::new(10, 20, true)),
            &key_pair,
        )
        .unwrap();

        let signing = message.encode_for_signing();
        let transmission = message.encode_for_transmission();
        assert_eq!(signing.len(), 8 + 2 + 17 + 32);
        assert_eq!(transmission.len(), signing.len() + 64);
        assert_eq!(&transmission[..signing.len()], signing.as_slice());
        assert_eq!(&signing[8..10], &[0, 11]);
        assert_eq!(&signing[27..59], key_pair.identifier().as_bytes());
    }

    #[test]
    fn test_decode_round_trip_and_verify() {
        let message = Message::new(
            MessageType::StatusResponse18,
            MessageContent::StatusResponse(StatusResponse::new(vec!["ok".to_string()])),
            &key_pair(),
        )
        .unwrap();
        assert_eq!(message.signature_state(), SignatureState::Valid);

        let mut decoded = Message::decode(&message.encode_for_transmission()).unwrap();
        assert_eq!(decoded.signature_state(), SignatureState::Undetermined);
        assert_eq!(decoded.get_timestamp(), message.get_timestamp());
        assert_eq!(decoded.get_content(), message.get_content());
        assert!(decoded.verify_signature());
        assert_eq!(decoded.signature_state(), SignatureState::Valid);
    }

    #[test]
    fn test_tampered_message_is_invalid() {
        let message = Message::new(
            MessageType::StatusRequest17,
            MessageContent::Empty,
            &key_pair(),
        )
        .unwrap();
        let mut bytes = message.encode_for_transmission();
        bytes[0] ^= 0xff;
        let mut decoded = Message::decode(&bytes).unwrap();
        assert!(!decoded.verify_signature());
        assert_eq!(decoded.signature_state(), SignatureState::Invalid);
    }

    #[test]
    fn test_unregistered_type_keeps_empty_content_and_still_verifies() {
        let key_pair = key_pair();
        let mut signing = vec![];
        signing.extend(&1_000u64.to_be_bytes());
        signing.extend(&MessageType::Ping200.value().to_be_bytes());
        signing.extend(b"opaque");
        signing.extend(key_pair.identifier().as_bytes());
        let signature = key_pair.sign(&signing);
        let mut bytes = signing.clone();
        bytes.extend(signature.as_bytes());

        let mut decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded.get_type(), MessageType::Ping200);
        assert_eq!(decoded.get_content(), &MessageContent::Empty);
        assert!(decoded.verify_signature());
    }

    #[test]
    fn test_trailing_content_bytes_are_tolerated() {
        let key_pair = key_pair();
        let mut signing = vec![];
        signing.extend(&1_000u64.to_be_bytes());
        signing.extend(&MessageType::BlockRequest11.value().to_be_bytes());
        signing.extend(BlockRequest::new(3, 4, false).encode());
        signing.extend([0xde, 0xad, 0xbe]);
        signing.extend(key_pair.identifier().as_bytes());
        let mut bytes = signing.clone();
        bytes.extend(key_pair.sign(&signing).as_bytes());

        let mut decoded = Message::decode(&bytes).unwrap();
        assert_eq!(
            decoded.get_content(),
            &MessageContent::BlockRequest(BlockRequest::new(3, 4, false))
        );
        assert_eq!(decoded.get_content().byte_size() + 3, 17 + 3);
        assert!(decoded.verify_signature());
    }

    #[test]
    fn test_transaction_content_must_fit_message_layout() {
        let parent = crate::core::Transfer {
            timestamp: 1,
            amount: 10,
            receiver_identifier: Identifier([2u8; 32]),
            previous_hash_height: 0,
            previous_block_hash: [0u8; 32],
            sender_identifier: Identifier([3u8; 32]),
            sender_data: vec![],
            signature: Signature([4u8; 64]),
        };
        let child = crate::core::CycleSignatureTransaction {
            timestamp: 2,
            sender_identifier: Identifier([5u8; 32]),
            vote: true,
            cycle_transaction_signature: parent.signature,
            signature: Signature([6u8; 64]),
        };
        let cycle = Transaction::Cycle {
            transfer: parent,
            cycle_signatures: crate::core::CycleSignatures::Transactions(vec![child]),
        };
        let result = Message::new(
            MessageType::Transaction5,
            MessageContent::Transaction(cycle),
            &key_pair(),
        );
        assert!(matches!(result, Err(NyzoError::LayoutMismatch(_))));
    }

    #[test]
    fn test_short_and_unknown_messages_are_rejected() {
        assert!(matches!(
            Message::decode(&[0u8; 105]),
            Err(NyzoError::MalformedBuffer(_))
        ));

        let mut bytes = vec![0u8; 106];
        bytes[8..10].copy_from_slice(&999u16.to_be_bytes());
        assert_eq!(
            Message::decode(&bytes),
            Err(NyzoError::UnknownMessageType(999))
        );
    }

    #[test]
    fn test_json_view() {
        let message = Message::new(
            MessageType::StatusRequest17,
            MessageContent::Empty,
            &key_pair(),
        )
        .unwrap();
        let json = message.to_json().unwrap();
        assert!(json.contains("\"message_type\":\"StatusRequest17\""));
        assert!(json.contains("\"kind\":\"empty\""));
        assert!(!json.contains("received_signing_bytes"));
    }
}
