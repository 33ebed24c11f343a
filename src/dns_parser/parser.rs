use byteorder::{BigEndian, ByteOrder};

use super::header::HEADER_SIZE;
use super::{Class, Error, Header, Name, Packet, Question, RRData, ResourceRecord, Section, Type};

impl Packet {
    /// Parse a full DNS Packet and return a structure that has all the
    /// data copied out of the buffer
    ///
    /// Bytes after the last declared record are ignored.
    pub fn parse(data: &[u8]) -> Result<Packet, Error> {
        Packet::parse_prefix(data).map(|(packet, _)| packet)
    }

    /// Like [`Packet::parse`] but fails with `TrailingBytes` if anything
    /// follows the last declared record
    pub fn parse_strict(data: &[u8]) -> Result<Packet, Error> {
        let (packet, offset) = Packet::parse_prefix(data)?;
        if offset != data.len() {
            return Err(Error::TrailingBytes(data.len() - offset));
        }
        Ok(packet)
    }

    fn parse_prefix(data: &[u8]) -> Result<(Packet, usize), Error> {
        let header = Header::parse(data)?;
        let mut offset = HEADER_SIZE;

        let mut questions = Vec::with_capacity(capacity(header.questions, data, MIN_QUESTION_SIZE));
        for index in 0..header.questions as usize {
            let question =
                parse_question(data, &mut offset).map_err(|e| e.at(Section::Question, index))?;
            questions.push(question);
        }

        let answers = parse_records(data, &mut offset, header.answers, Section::Answer)?;
        let nameservers = parse_records(data, &mut offset, header.nameservers, Section::Authority)?;
        let additional = parse_records(data, &mut offset, header.additional, Section::Additional)?;

        let packet = Packet {
            header,
            questions,
            answers,
            nameservers,
            additional,
        };
        Ok((packet, offset))
    }
}

/// Root name, type and class
const MIN_QUESTION_SIZE: usize = 5;
/// Root name, type, class, TTL and RDATA length
const MIN_RECORD_SIZE: usize = 11;

/// Counts come from the wire, so allocate no more than `data` can hold
fn capacity(count: u16, data: &[u8], min_size: usize) -> usize {
    (count as usize).min(data.len() / min_size)
}

fn read_u16(data: &[u8], offset: &mut usize) -> Result<u16, Error> {
    let raw = data.get(*offset..*offset + 2).ok_or(Error::UnexpectedEOF)?;
    *offset += 2;
    Ok(BigEndian::read_u16(raw))
}

fn read_u32(data: &[u8], offset: &mut usize) -> Result<u32, Error> {
    let raw = data.get(*offset..*offset + 4).ok_or(Error::UnexpectedEOF)?;
    *offset += 4;
    Ok(BigEndian::read_u32(raw))
}

fn parse_question(data: &[u8], offset: &mut usize) -> Result<Question, Error> {
    let (qname, size) = Name::scan(data, *offset)?;
    *offset += size;
    let qtype = Type(read_u16(data, offset)?);
    let qclass = Class(read_u16(data, offset)?);
    Ok(Question {
        qname,
        qtype,
        qclass,
    })
}

fn parse_records(
    data: &[u8],
    offset: &mut usize,
    count: u16,
    section: Section,
) -> Result<Vec<ResourceRecord>, Error> {
    let mut records = Vec::with_capacity(capacity(count, data, MIN_RECORD_SIZE));
    for index in 0..count as usize {
        let record = parse_record(data, offset).map_err(|e| e.at(section, index))?;
        records.push(record);
    }
    Ok(records)
}

fn parse_record(data: &[u8], offset: &mut usize) -> Result<ResourceRecord, Error> {
    let (name, size) = Name::scan(data, *offset)?;
    *offset += size;
    let typ = Type(read_u16(data, offset)?);
    let cls = Class(read_u16(data, offset)?);
    let ttl = read_u32(data, offset)?;
    let rdlen = read_u16(data, offset)? as usize;
    let rdata = RRData::parse(typ, data, *offset, rdlen)?;
    *offset += rdlen;
    Ok(ResourceRecord {
        name,
        cls,
        ttl,
        data: rdata,
    })
}
