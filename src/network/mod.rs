//! Peer wire protocol
//!
//! Message types, the signed message envelope, the content codecs and the
//! framed TCP connection that carries them.

pub mod connection;
pub mod message;
pub mod message_type;
pub mod messages;

pub use connection::{frame, Connection, ConnectionState};
pub use message::{Message, MessageContent, SignatureState};
pub use message_type::MessageType;
pub use messages::{BlockRequest, BlockResponse, StatusResponse, TransactionResponse};
