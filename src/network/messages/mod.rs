//! Content codecs for the message types this client speaks

pub mod block_request;
pub mod block_response;
pub mod status_response;
pub mod transaction_response;

pub use block_request::BlockRequest;
pub use block_response::BlockResponse;
pub use status_response::StatusResponse;
pub use transaction_response::TransactionResponse;
