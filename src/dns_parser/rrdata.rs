use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::{Error, Name, Type};

/// The enumeration that represents known types of DNS resource records data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RRData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    CNAME(Name),
    NS(Name),
    /// Every other type, TXT included, kept as the raw value bytes
    ///
    /// Raw bytes of an interpreted type are checked when the record is
    /// written, see [`RRData::is_interpreted`].
    Opaque { typ: Type, data: Vec<u8> },
}

impl RRData {
    pub fn typ(&self) -> Type {
        match *self {
            RRData::A(..) => Type::A,
            RRData::AAAA(..) => Type::AAAA,
            RRData::CNAME(..) => Type::CNAME,
            RRData::NS(..) => Type::NS,
            RRData::Opaque { typ, .. } => typ,
        }
    }

    /// Whether values of `typ` decode to something other than `Opaque`
    pub fn is_interpreted(typ: Type) -> bool {
        matches!(typ, Type::A | Type::AAAA | Type::CNAME | Type::NS)
    }

    /// Builds a value of type `typ` from its textual form
    ///
    /// Addresses are parsed as IP literals, CNAME and NS values as names and
    /// anything else is taken as raw bytes.
    pub fn from_text(typ: Type, value: &str) -> Result<RRData, Error> {
        match typ {
            Type::A => value
                .parse()
                .map(RRData::A)
                .map_err(|_| Error::InvalidAddress(value.to_owned())),
            Type::AAAA => value
                .parse()
                .map(RRData::AAAA)
                .map_err(|_| Error::InvalidAddress(value.to_owned())),
            Type::CNAME => Ok(RRData::CNAME(value.parse()?)),
            Type::NS => Ok(RRData::NS(value.parse()?)),
            typ => Ok(RRData::Opaque {
                typ,
                data: value.as_bytes().to_vec(),
            }),
        }
    }

    pub fn write_to<T: io::Write>(&self, writer: &mut T) -> Result<(), Error> {
        match *self {
            RRData::A(ip) => writer.write_u32::<BigEndian>(ip.into())?,
            RRData::AAAA(ip) => writer.write_all(&ip.octets())?,
            RRData::CNAME(ref name) | RRData::NS(ref name) => name.write_to(writer)?,
            RRData::Opaque { ref data, .. } => writer.write_all(data)?,
        }
        Ok(())
    }

    /// Interprets the value bytes `original[offset..offset + len]`
    ///
    /// Names inside the value may point anywhere before them in `original`.
    pub fn parse(typ: Type, original: &[u8], offset: usize, len: usize) -> Result<RRData, Error> {
        let end = offset + len;
        let rdata = original.get(offset..end).ok_or(Error::UnexpectedEOF)?;
        match typ {
            Type::A => {
                if rdata.len() != 4 {
                    return Err(Error::WrongRdataLength);
                }
                Ok(RRData::A(Ipv4Addr::from(BigEndian::read_u32(rdata))))
            }
            Type::AAAA => {
                let mut octets = [0u8; 16];
                if rdata.len() != octets.len() {
                    return Err(Error::WrongRdataLength);
                }
                octets.copy_from_slice(rdata);
                Ok(RRData::AAAA(Ipv6Addr::from(octets)))
            }
            Type::CNAME => Ok(RRData::CNAME(parse_name(original, offset, end)?)),
            Type::NS => Ok(RRData::NS(parse_name(original, offset, end)?)),
            typ => Ok(RRData::Opaque {
                typ,
                data: rdata.to_vec(),
            }),
        }
    }
}

/// A name value must fill its RDATA exactly
fn parse_name(original: &[u8], offset: usize, end: usize) -> Result<Name, Error> {
    let (name, size) = Name::scan(&original[..end], offset).map_err(|e| match e {
        Error::UnexpectedEOF => Error::WrongRdataLength,
        e => e,
    })?;
    if offset + size != end {
        return Err(Error::WrongRdataLength);
    }
    Ok(name)
}

impl fmt::Display for RRData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RRData::A(ip) => write!(f, "{}", ip),
            RRData::AAAA(ip) => write!(f, "{}", ip),
            RRData::CNAME(ref name) | RRData::NS(ref name) => write!(f, "{}", name),
            RRData::Opaque { ref data, .. } => write!(f, "{}", String::from_utf8_lossy(data)),
        }
    }
}
