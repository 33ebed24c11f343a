use std::collections::HashSet;
use std::fmt;
use std::io;
use std::str::{from_utf8, FromStr};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::Error;

/// Longest label allowed on the wire
pub const MAX_LABEL_LEN: usize = 63;

const POINTER_MASK: u8 = 0b1100_0000;

/// A domain name as a dot-separated sequence of labels
///
/// Names read from a packet are copied out of it, so they stay valid after
/// the packet buffer is gone. The root name is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name(String);

impl Name {
    /// Reads a name starting at `offset` in the whole packet `data`
    ///
    /// Returns the name and the number of bytes it occupies at `offset`.
    /// Compression pointers are resolved against `data`; the bytes a pointer
    /// leads to are not counted.
    pub fn scan(data: &[u8], offset: usize) -> Result<(Name, usize), Error> {
        let mut name = String::new();
        let mut pos = offset;
        let mut consumed = None;
        let mut visited = HashSet::new();
        loop {
            let byte = *data.get(pos).ok_or(Error::UnexpectedEOF)?;
            if byte == 0 {
                pos += 1;
                break;
            } else if byte & POINTER_MASK == POINTER_MASK {
                let raw = data.get(pos..pos + 2).ok_or(Error::UnexpectedEOF)?;
                let target = (BigEndian::read_u16(raw) & !0b1100_0000_0000_0000) as usize;
                // also rules out targets past the end of the packet
                if target >= pos {
                    return Err(Error::InvalidPointer { at: pos, target });
                }
                if !visited.insert(target) {
                    return Err(Error::PointerLoop);
                }
                consumed.get_or_insert(pos + 2 - offset);
                pos = target;
            } else if byte & POINTER_MASK == 0 {
                let end = pos + 1 + byte as usize;
                let label = data.get(pos + 1..end).ok_or(Error::UnexpectedEOF)?;
                let label = from_utf8(label).map_err(|_| Error::LabelIsNotUtf8)?;
                if !name.is_empty() {
                    name.push('.');
                }
                name.push_str(label);
                pos = end;
            } else {
                return Err(Error::UnknownLabelFormat);
            }
        }
        // after a jump `pos` lies before `offset`, only the first pointer counts
        let consumed = match consumed {
            Some(consumed) => consumed,
            None => pos - offset,
        };
        Ok((Name(name), consumed))
    }

    /// The root name
    pub fn root() -> Name {
        Name(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the labels, the root name has none
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        let labels = if self.0.is_empty() { None } else { Some(self.0.split('.')) };
        labels.into_iter().flatten()
    }

    /// Writes the uncompressed wire form of the name
    pub fn write_to<T: io::Write>(&self, writer: &mut T) -> Result<(), Error> {
        for label in self.labels() {
            write_label(writer, label)?;
        }
        writer.write_u8(0)?;
        Ok(())
    }
}

pub(crate) fn write_label<T: io::Write>(writer: &mut T, label: &str) -> Result<(), Error> {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return Err(Error::InvalidLabel(label.to_owned()));
    }
    writer.write_u8(label.len() as u8)?;
    writer.write_all(label.as_bytes())?;
    Ok(())
}

impl FromStr for Name {
    type Err = Error;

    /// Accepts an optional trailing dot, `""` and `"."` are the root
    fn from_str(name: &str) -> Result<Name, Error> {
        let name = name.strip_suffix('.').unwrap_or(name);
        if name.is_empty() {
            return Ok(Name::root());
        }
        if let Some(bad) = name
            .split('.')
            .find(|label| label.is_empty() || label.len() > MAX_LABEL_LEN)
        {
            return Err(Error::InvalidLabel(bad.to_owned()));
        }
        Ok(Name(name.to_owned()))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::Name;
    use crate::dns_parser::Error;

    fn wire(name: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        name.parse::<Name>().unwrap().write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn write_plain() {
        assert_eq!(wire("www.ruotian.vip"), b"\x03www\x07ruotian\x03vip\x00");
        assert_eq!(wire("example.com."), b"\x07example\x03com\x00");
        assert_eq!(wire(""), b"\x00");
        assert_eq!(wire("."), b"\x00");
    }

    #[test]
    fn scan_plain() {
        let data = b"\x03www\x07ruotian\x03vip\x00\x00\x01";
        let (name, size) = Name::scan(data, 0).unwrap();
        assert_eq!(name.as_str(), "www.ruotian.vip");
        assert_eq!(size, 17);
    }

    #[test]
    fn scan_what_was_written() {
        for name in &["a", "www.example.com", "_xmpp-server._tcp.gmail.com", ""] {
            let data = wire(name);
            let (parsed, size) = Name::scan(&data, 0).unwrap();
            assert_eq!(parsed.as_str(), *name);
            assert_eq!(size, data.len());
        }
        let longest = "x".repeat(63);
        let data = wire(&longest);
        assert_eq!(Name::scan(&data, 0).unwrap().0.as_str(), longest);
    }

    #[test]
    fn scan_pointer() {
        // "baidu.vip" at 4, then "www" + pointer to it at 15
        let mut data = vec![0u8; 4];
        data.extend_from_slice(b"\x05baidu\x03vip\x00");
        data.extend_from_slice(b"\x03www\xc0\x04");

        let (direct, _) = Name::scan(&data, 4).unwrap();
        let (suffix_only, size) = Name::scan(&data, 19).unwrap();
        assert_eq!(suffix_only, direct);
        assert_eq!(size, 2);

        let (name, size) = Name::scan(&data, 15).unwrap();
        assert_eq!(name.as_str(), "www.baidu.vip");
        assert_eq!(size, 6);
    }

    #[test]
    fn chained_pointers() {
        // "com" at 0, "example" -> 0 at 5, "www" -> 5 at 15
        let data = b"\x03com\x00\x07example\xc0\x00\x03www\xc0\x05";
        let (name, size) = Name::scan(data, 15).unwrap();
        assert_eq!(name.as_str(), "www.example.com");
        assert_eq!(size, 6);
    }

    #[test]
    fn pointer_ending_before_start() {
        // the name at 40 jumps back to 12 and finishes well before 40
        let mut data = vec![0u8; 12];
        data.extend_from_slice(b"\x03www\x07ruotian\x03vip\x00");
        data.resize(40, 0);
        data.extend_from_slice(b"\xc0\x0c");

        let (name, size) = Name::scan(&data, 40).unwrap();
        assert_eq!(name.as_str(), "www.ruotian.vip");
        assert_eq!(size, 2);
    }

    #[test]
    fn forward_pointer() {
        let data = b"\xc0\x02\x03com\x00";
        assert!(matches!(
            Name::scan(data, 0),
            Err(Error::InvalidPointer { at: 0, target: 2 })
        ));
    }

    #[test]
    fn self_pointer() {
        let data = b"\x00\x00\xc0\x02";
        assert!(matches!(
            Name::scan(data, 2),
            Err(Error::InvalidPointer { at: 2, target: 2 })
        ));
    }

    #[test]
    fn out_of_range_pointer() {
        let data = b"\x01a\xff\xff";
        assert!(matches!(
            Name::scan(data, 0),
            Err(Error::InvalidPointer { at: 2, .. })
        ));
    }

    #[test]
    fn pointer_loop() {
        // label "a" followed by a pointer back to the label itself
        let data = b"\x01a\xc0\x00";
        assert!(matches!(Name::scan(data, 0), Err(Error::PointerLoop)));
    }

    #[test]
    fn truncated() {
        let data = wire("www.example.com");
        for len in 0..data.len() {
            assert!(matches!(
                Name::scan(&data[..len], 0),
                Err(Error::UnexpectedEOF)
            ));
        }
        assert!(matches!(Name::scan(b"\x03ab\xc0", 3), Err(Error::UnexpectedEOF)));
    }

    #[test]
    fn reserved_label_format() {
        assert!(matches!(
            Name::scan(b"\x41abc\x00", 0),
            Err(Error::UnknownLabelFormat)
        ));
        assert!(matches!(
            Name::scan(b"\x81abc\x00", 0),
            Err(Error::UnknownLabelFormat)
        ));
    }

    #[test]
    fn non_utf8_label() {
        assert!(matches!(
            Name::scan(b"\x02\xff\xfe\x00", 0),
            Err(Error::LabelIsNotUtf8)
        ));
    }

    #[test]
    fn invalid_labels() {
        assert!(matches!("a..b".parse::<Name>(), Err(Error::InvalidLabel(_))));
        assert!(matches!(".a".parse::<Name>(), Err(Error::InvalidLabel(_))));
        let long = format!("{}.com", "x".repeat(64));
        assert!(matches!(long.parse::<Name>(), Err(Error::InvalidLabel(_))));
    }
}
