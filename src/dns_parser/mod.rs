//! The DNS message codec
//!
//! Use [`Builder`] to create a new outgoing packet, either an empty query or
//! a response seeded from a parsed request.
//!
//! Use [`Packet::parse`] to parse a packet into a data structure.
//!
//! Parsed packets own their data, so the receive buffer may be reused as soon
//! as parsing returns.

mod builder;
mod enums;
mod error;
mod header;
mod name;
mod parser;
mod rrdata;
mod structs;

pub use self::builder::Builder;
pub use self::enums::{Class, Opcode, ResponseCode, Type};
pub use self::error::Error;
pub use self::header::Header;
pub use self::name::Name;
pub use self::rrdata::RRData;
pub use self::structs::{Packet, Question, ResourceRecord, Section};

/// Parses a packet, ignoring any bytes after the last declared record
pub fn decode(data: &[u8]) -> Result<Packet, Error> {
    Packet::parse(data)
}

/// Parses a packet, rejecting bytes after the last declared record
pub fn decode_strict(data: &[u8]) -> Result<Packet, Error> {
    Packet::parse_strict(data)
}

/// Serializes the message accumulated in `builder`
pub fn encode(builder: Builder) -> Result<Vec<u8>, Error> {
    builder.build()
}
