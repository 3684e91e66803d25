//! Shared building blocks for the Parlor chat server and client.
//!
//! Both endpoints speak the same protocol: a raw client id written right
//! after accept, followed by length-prefixed JSON [`Message`] frames.

pub mod codec;
pub mod error;
pub mod handshake;
pub mod logger;
pub mod protocol;
pub mod time;

pub use codec::{MAX_FRAME_LENGTH, MessageCodec};
pub use error::ProtocolError;
pub use handshake::{read_client_id, write_client_id};
pub use protocol::{
    BAN_NOTICE, DEFAULT_PORT, Message, MessageType, SERVER_ID, SYSTEM_NAME, UNBAN_NOTICE,
    split_sender,
};
