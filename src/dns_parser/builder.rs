use std::collections::HashMap;
use std::convert::TryFrom;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::header::HEADER_SIZE;
use super::name::write_label;
use super::{
    Class, Error, Header, Name, Opcode, Packet, Question, RRData, ResourceRecord, ResponseCode,
    Section, Type,
};

/// Pointers can only address the first 16 KiB of a packet
const MAX_POINTER_OFFSET: usize = 0x3FFF;

/// Allows to build a DNS packet
///
/// Both query and response packets may be built with this interface. The
/// builder keeps the message in structured form until [`Builder::build`],
/// so section counts always match the sections that are written.
#[derive(Debug, Clone)]
pub struct Builder {
    packet: Packet,
    /// Offsets of names already written, used when compression is enabled
    names: HashMap<String, u16>,
    compress: bool,
}

impl Builder {
    fn with_header(header: Header) -> Builder {
        Builder {
            packet: Packet {
                header,
                questions: Vec::new(),
                answers: Vec::new(),
                nameservers: Vec::new(),
                additional: Vec::new(),
            },
            names: HashMap::new(),
            compress: false,
        }
    }

    /// Creates a new query
    ///
    /// Initially all sections are empty. You're expected to fill
    /// the questions section with `add_question`
    pub fn new_query(id: u16, recursion: bool) -> Builder {
        Builder::with_header(Header {
            id,
            query: true,
            opcode: Opcode::StandardQuery,
            authoritative: false,
            truncated: false,
            recursion_desired: recursion,
            recursion_available: false,
            reserved: 0,
            response_code: ResponseCode::NoError,
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        })
    }

    /// Creates a response to `request`
    ///
    /// Id, opcode and the recursion desired flag are copied from the request
    /// and every question of the request is repeated.
    pub fn new_response(request: &Packet) -> Builder {
        let mut builder = Builder::with_header(Builder::response_header(&request.header));
        for question in &request.questions {
            builder.add_question(question.qname.clone(), question.qtype, question.qclass);
        }
        builder
    }

    /// Creates a response carrying nothing but `code`
    ///
    /// Useful when the request can't be parsed past its header.
    pub fn error_response(request: &Header, code: ResponseCode) -> Builder {
        let mut builder = Builder::with_header(Builder::response_header(request));
        builder.set_response_code(code);
        builder
    }

    fn response_header(request: &Header) -> Header {
        Header {
            id: request.id,
            query: false,
            opcode: request.opcode,
            authoritative: false,
            truncated: false,
            recursion_desired: request.recursion_desired,
            recursion_available: false,
            reserved: 0,
            response_code: ResponseCode::NoError,
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        }
    }

    pub fn set_recursion_available(&mut self, available: bool) -> &mut Builder {
        self.packet.header.recursion_available = available;
        self
    }

    pub fn set_response_code(&mut self, code: ResponseCode) -> &mut Builder {
        self.packet.header.response_code = code;
        self
    }

    /// Replace repeated names by pointers to their first occurrence
    ///
    /// Off by default, in which case every name is written in full.
    pub fn set_compression(&mut self, compress: bool) -> &mut Builder {
        self.compress = compress;
        self
    }

    pub fn header(&self) -> &Header {
        &self.packet.header
    }

    /// The message as built so far
    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    pub fn is_empty(&self) -> bool {
        self.packet.questions.is_empty()
            && self.packet.answers.is_empty()
            && self.packet.nameservers.is_empty()
            && self.packet.additional.is_empty()
    }

    /// Adds a question to the packet
    pub fn add_question(&mut self, qname: Name, qtype: Type, qclass: Class) -> &mut Builder {
        self.packet.questions.push(Question {
            qname,
            qtype,
            qclass,
        });
        self.packet.header.questions = self.packet.header.questions.saturating_add(1);
        self
    }

    pub fn add_answer(&mut self, name: Name, cls: Class, ttl: u32, data: RRData) -> &mut Builder {
        self.packet.answers.push(ResourceRecord {
            name,
            cls,
            ttl,
            data,
        });
        self.packet.header.answers = self.packet.header.answers.saturating_add(1);
        self
    }

    pub fn add_nameserver(
        &mut self,
        name: Name,
        cls: Class,
        ttl: u32,
        data: RRData,
    ) -> &mut Builder {
        self.packet.nameservers.push(ResourceRecord {
            name,
            cls,
            ttl,
            data,
        });
        self.packet.header.nameservers = self.packet.header.nameservers.saturating_add(1);
        self
    }

    pub fn add_additional(
        &mut self,
        name: Name,
        cls: Class,
        ttl: u32,
        data: RRData,
    ) -> &mut Builder {
        self.packet.additional.push(ResourceRecord {
            name,
            cls,
            ttl,
            data,
        });
        self.packet.header.additional = self.packet.header.additional.saturating_add(1);
        self
    }

    /// Returns the final packet
    ///
    /// Counts in the header are taken from the sections themselves.
    pub fn build(self) -> Result<Vec<u8>, Error> {
        let Builder {
            packet,
            names,
            compress,
        } = self;

        let mut header = packet.header;
        header.questions = count(&packet.questions, Section::Question)?;
        header.answers = count(&packet.answers, Section::Answer)?;
        header.nameservers = count(&packet.nameservers, Section::Authority)?;
        header.additional = count(&packet.additional, Section::Additional)?;

        let mut writer = Writer {
            buf: Vec::with_capacity(512),
            names,
            compress,
        };
        writer.buf.extend_from_slice(&[0u8; HEADER_SIZE]);
        header.write(&mut writer.buf[..HEADER_SIZE]);

        for question in &packet.questions {
            writer.write_name(&question.qname)?;
            writer.buf.write_u16::<BigEndian>(question.qtype.into())?;
            writer.buf.write_u16::<BigEndian>(question.qclass.into())?;
        }
        for rr in packet
            .answers
            .iter()
            .chain(&packet.nameservers)
            .chain(&packet.additional)
        {
            writer.write_rr(rr)?;
        }
        Ok(writer.buf)
    }
}

fn count<T>(section: &[T], name: Section) -> Result<u16, Error> {
    u16::try_from(section.len()).map_err(|_| Error::TooManyRecords(name))
}

struct Writer {
    buf: Vec<u8>,
    names: HashMap<String, u16>,
    compress: bool,
}

impl Writer {
    fn write_name(&mut self, name: &Name) -> Result<(), Error> {
        if !self.compress {
            return name.write_to(&mut self.buf);
        }
        let labels: Vec<&str> = name.labels().collect();
        for i in 0..labels.len() {
            let suffix = labels[i..].join(".");
            if let Some(&offset) = self.names.get(&suffix) {
                self.buf.write_u16::<BigEndian>(0b1100_0000_0000_0000 | offset)?;
                return Ok(());
            }
            let here = self.buf.len();
            if here <= MAX_POINTER_OFFSET {
                self.names.insert(suffix, here as u16);
            }
            write_label(&mut self.buf, labels[i])?;
        }
        self.buf.write_u8(0)?;
        Ok(())
    }

    fn write_rr(&mut self, rr: &ResourceRecord) -> Result<(), Error> {
        self.write_name(&rr.name)?;
        self.buf.write_u16::<BigEndian>(rr.typ().into())?;
        self.buf.write_u16::<BigEndian>(rr.cls.into())?;
        self.buf.write_u32::<BigEndian>(rr.ttl)?;

        let size_offset = self.buf.len();
        self.buf.write_u16::<BigEndian>(0)?;

        let data_offset = self.buf.len();
        match rr.data {
            // raw bytes must read back as the type they claim
            RRData::Opaque { typ, ref data } if RRData::is_interpreted(typ) => {
                let data = RRData::parse(typ, data, 0, data.len())?;
                self.write_rdata(&data)?;
            }
            ref data => self.write_rdata(data)?,
        }
        let data_size = self.buf.len() - data_offset;
        let data_size = u16::try_from(data_size).map_err(|_| Error::RdataTooLong(data_size))?;

        BigEndian::write_u16(&mut self.buf[size_offset..size_offset + 2], data_size);
        Ok(())
    }

    fn write_rdata(&mut self, data: &RRData) -> Result<(), Error> {
        match *data {
            RRData::CNAME(ref name) | RRData::NS(ref name) => self.write_name(name),
            ref data => data.write_to(&mut self.buf),
        }
    }
}
