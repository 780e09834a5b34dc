use crate::error::NyzoError;
use serde::Serialize;

macro_rules! message_types {
    ($($name:ident = $value:literal,)+) => {
        /// Every message kind a peer may send; the number is the wire tag
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[repr(u16)]
        pub enum MessageType {
            $($name = $value,)+
        }

        impl TryFrom<u16> for MessageType {
            type Error = NyzoError;

            fn try_from(tag: u16) -> Result<Self, NyzoError> {
                match tag {
                    $($value => Ok(MessageType::$name),)+
                    other => Err(NyzoError::UnknownMessageType(other)),
                }
            }
        }
    };
}

message_types! {
    Invalid0 = 0,
    BootstrapRequest1 = 1, // superseded by BootstrapRequestV2_35
    BootstrapResponse2 = 2, // superseded by BootstrapResponseV2_36
    NodeJoin3 = 3,
    NodeJoinResponse4 = 4,
    Transaction5 = 5,
    TransactionResponse6 = 6,
    PreviousHashRequest7 = 7,
    PreviousHashResponse8 = 8,
    NewBlock9 = 9,
    NewBlockResponse10 = 10,
    BlockRequest11 = 11,
    BlockResponse12 = 12,
    TransactionPoolRequest13 = 13,
    TransactionPoolResponse14 = 14,
    MeshRequest15 = 15,
    MeshResponse16 = 16,
    StatusRequest17 = 17,
    StatusResponse18 = 18,
    BlockVote19 = 19,
    BlockVoteResponse20 = 20,
    NewVerifierVote21 = 21,
    NewVerifierVoteResponse22 = 22,
    MissingBlockVoteRequest23 = 23,
    MissingBlockVoteResponse24 = 24,
    MissingBlockRequest25 = 25,
    MissingBlockResponse26 = 26,
    TimestampRequest27 = 27,
    TimestampResponse28 = 28,
    HashVoteOverrideRequest29 = 29,
    HashVoteOverrideResponse30 = 30,
    ConsensusThresholdOverrideRequest31 = 31,
    ConsensusThresholdOverrideResponse32 = 32,
    NewVerifierVoteOverrideRequest33 = 33,
    NewVerifierVoteOverrideResponse34 = 34,
    BootstrapRequestV2_35 = 35,
    BootstrapResponseV2_36 = 36,
    BlockWithVotesRequest37 = 37,
    BlockWithVotesResponse38 = 38,

    // test
    Ping200 = 200,
    PingResponse201 = 201,

    // maintenance
    UpdateRequest300 = 300,
    UpdateResponse301 = 301,

    // debugging
    BlockRejectionRequest400 = 400,
    BlockRejectionResponse401 = 401,
    DetachmentRequest402 = 402,
    DetachmentResponse403 = 403,
    UnfrozenBlockPoolPurgeRequest404 = 404,
    UnfrozenBlockPoolPurgeResponse405 = 405,
    UnfrozenBlockPoolStatusRequest406 = 406,
    UnfrozenBlockPoolStatusResponse407 = 407,
    MeshStatusRequest408 = 408,
    MeshStatusResponse409 = 409,
    TogglePauseRequest410 = 410,
    TogglePauseResponse411 = 411,
    ConsensusTallyStatusRequest412 = 412,
    ConsensusTallyStatusResponse413 = 413,
    NewVerifierTallyStatusRequest414 = 414,
    NewVerifierTallyStatusResponse415 = 415,
    BlacklistStatusRequest416 = 416,
    BlacklistStatusResponse417 = 417,

    // bootstrapping
    ResetRequest500 = 500,
    ResetResponse501 = 501,

    IncomingRequest65533 = 65533,
    Error65534 = 65534,
    Unknown65535 = 65535,
}

impl MessageType {
    pub fn value(self) -> u16 {
        self as u16
    }
}
