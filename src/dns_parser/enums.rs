use std::fmt;

/// The TYPE value of a question or resource record
///
/// Any 16-bit value is accepted and written back unchanged; the constants
/// only name the codes this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Type(pub u16);

impl Type {
    /// a host address
    pub const A: Type = Type(1);
    /// an authoritative name server
    pub const NS: Type = Type(2);
    /// a mail destination (obsolete, use MX)
    pub const MD: Type = Type(3);
    /// a mail forwarder (obsolete, use MX)
    pub const MF: Type = Type(4);
    /// the canonical name for an alias
    pub const CNAME: Type = Type(5);
    /// marks the start of a zone of authority
    pub const SOA: Type = Type(6);
    /// a mailbox domain name (experimental)
    pub const MB: Type = Type(7);
    /// a mail group member (experimental)
    pub const MG: Type = Type(8);
    /// a mail rename domain name (experimental)
    pub const MR: Type = Type(9);
    /// a null RR (experimental)
    pub const NULL: Type = Type(10);
    /// a well known service description
    pub const WKS: Type = Type(11);
    /// a domain name pointer
    pub const PTR: Type = Type(12);
    /// host information
    pub const HINFO: Type = Type(13);
    /// mailbox or mail list information
    pub const MINFO: Type = Type(14);
    /// mail exchange
    pub const MX: Type = Type(15);
    /// text strings
    pub const TXT: Type = Type(16);
    /// IPv6 host address
    pub const AAAA: Type = Type(28);

    fn mnemonic(self) -> Option<&'static str> {
        let name = match self.0 {
            1 => "A",
            2 => "NS",
            3 => "MD",
            4 => "MF",
            5 => "CNAME",
            6 => "SOA",
            7 => "MB",
            8 => "MG",
            9 => "MR",
            10 => "NULL",
            11 => "WKS",
            12 => "PTR",
            13 => "HINFO",
            14 => "MINFO",
            15 => "MX",
            16 => "TXT",
            28 => "AAAA",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u16> for Type {
    fn from(code: u16) -> Type {
        Type(code)
    }
}

impl From<Type> for u16 {
    fn from(typ: Type) -> u16 {
        typ.0
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => f.write_str(name),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

/// The CLASS value of a question or resource record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Class(pub u16);

impl Class {
    /// the Internet
    pub const IN: Class = Class(1);
    /// the CSNET class (obsolete)
    pub const CS: Class = Class(2);
    /// the CHAOS class
    pub const CH: Class = Class(3);
    /// Hesiod
    pub const HS: Class = Class(4);
}

impl From<u16> for Class {
    fn from(code: u16) -> Class {
        Class(code)
    }
}

impl From<Class> for u16 {
    fn from(cls: Class) -> u16 {
        cls.0
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            1 => f.write_str("IN"),
            2 => f.write_str("CS"),
            3 => f.write_str("CH"),
            4 => f.write_str("HS"),
            code => write!(f, "CLASS{}", code),
        }
    }
}

/// The OPCODE value according to RFC 1035
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    StandardQuery,
    InverseQuery,
    ServerStatusRequest,
    Reserved(u8),
}

impl From<u8> for Opcode {
    fn from(code: u8) -> Opcode {
        match code {
            0 => Opcode::StandardQuery,
            1 => Opcode::InverseQuery,
            2 => Opcode::ServerStatusRequest,
            x => Opcode::Reserved(x),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        match op {
            Opcode::StandardQuery => 0,
            Opcode::InverseQuery => 1,
            Opcode::ServerStatusRequest => 2,
            Opcode::Reserved(x) => x,
        }
    }
}

/// The RCODE value according to RFC 1035
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Reserved(u8),
}

impl From<u8> for ResponseCode {
    fn from(code: u8) -> ResponseCode {
        match code {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormatError,
            2 => ResponseCode::ServerFailure,
            3 => ResponseCode::NameError,
            4 => ResponseCode::NotImplemented,
            5 => ResponseCode::Refused,
            x => ResponseCode::Reserved(x),
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> u8 {
        match code {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Reserved(x) => x,
        }
    }
}
