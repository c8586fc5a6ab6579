//! Protocol module: named messages, the JSON envelope codec, command
//! validation, and frame sequence numbering.

pub mod codec;
pub mod command;
pub mod messages;
pub mod sequence;

pub use codec::{decode_envelope, decode_inbound, encode_outbound, Envelope, ProtocolError};
pub use command::{Command, CommandError, MouseButton};
pub use messages::*;
pub use sequence::SequenceCounter;
