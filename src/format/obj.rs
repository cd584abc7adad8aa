use crate::format::{FormatError, Section};

pub const MAGIC: &[u8; 6] = b"LC3OBJ";
pub const SUPPORTED_MAJOR: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version_major: u8,
    pub version_minor: u8,
    pub payload_origin: u16,
    pub payload_offset: u32,
    /// Payload length in 16-bit words.
    pub payload_size: u16,
    /// Present from format version 0.1 on.
    pub tables: Option<TableLocations>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocations {
    pub label_offset: u32,
    pub label_size: u32,
    pub linking_offset: u32,
    pub linking_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFile {
    pub header: Header,
    pub payload: Vec<u8>,
    pub labels: Vec<u8>,
    pub linking: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub target: u16,
    pub name: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    AbsoluteWord,
    OffsetPlusOneImm9,
    Unknown(u8),
}

impl LinkKind {
    #[must_use]
    pub fn from_u8(kind: u8) -> Self {
        match kind {
            0x01 => Self::AbsoluteWord,
            0x02 => Self::OffsetPlusOneImm9,
            _ => Self::Unknown(kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub address: u16,
    pub kind: LinkKind,
    pub name: Vec<u8>,
}

/// Parses an LC-3 object file header and slices out the payload and the
/// optional label/linking tables.
///
/// # Errors
/// Returns `FormatError::NotAnObjectFile` on a bad magic tag,
/// `FormatError::UnsupportedVersion` for a newer major version and
/// `FormatError::Truncated` when the header or any section runs past the end
/// of `input`.
pub fn parse_object(input: &[u8]) -> Result<ObjectFile, FormatError> {
    if input.len() < MAGIC.len() + 2 || !input.starts_with(MAGIC) {
        return Err(FormatError::NotAnObjectFile);
    }

    let mut reader = Reader::new(input, Section::Header);
    reader.skip(MAGIC.len())?;
    let version_major = reader.read_u8()?;
    let version_minor = reader.read_u8()?;
    if version_major > SUPPORTED_MAJOR {
        return Err(FormatError::UnsupportedVersion {
            major: version_major,
            minor: version_minor,
        });
    }

    let payload_origin = reader.read_u16_be()?;
    let payload_offset = reader.read_u32_be()?;
    let payload_size = reader.read_u16_be()?;
    let tables = if version_minor >= 1 {
        Some(TableLocations {
            label_offset: reader.read_u32_be()?,
            label_size: reader.read_u32_be()?,
            linking_offset: reader.read_u32_be()?,
            linking_size: reader.read_u32_be()?,
        })
    } else {
        None
    };

    let payload = section_slice(
        input,
        Section::Payload,
        u64::from(payload_offset),
        u64::from(payload_size) * 2,
    )?
    .to_vec();
    let (labels, linking) = match tables {
        Some(loc) => (
            section_slice(
                input,
                Section::Labels,
                u64::from(loc.label_offset),
                u64::from(loc.label_size),
            )?
            .to_vec(),
            section_slice(
                input,
                Section::Linking,
                u64::from(loc.linking_offset),
                u64::from(loc.linking_size),
            )?
            .to_vec(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    Ok(ObjectFile {
        header: Header {
            version_major,
            version_minor,
            payload_origin,
            payload_offset,
            payload_size,
            tables,
        },
        payload,
        labels,
        linking,
    })
}

/// Decodes a label table: `target.w length.b name[length]` per entry.
///
/// # Errors
/// Returns `FormatError::MalformedTable` when an entry is cut short.
pub fn parse_labels(input: &[u8]) -> Result<Vec<Label>, FormatError> {
    let mut reader = Reader::new(input, Section::Labels);
    let mut labels = Vec::new();
    while !reader.is_eof() {
        let target = reader.read_u16_be()?;
        let length = usize::from(reader.read_u8()?);
        let name = reader.read_bytes(length)?.to_vec();
        labels.push(Label { target, name });
    }
    Ok(labels)
}

/// Decodes a linking table: `address.w kind.b length.b name[length]` per entry.
///
/// # Errors
/// Returns `FormatError::MalformedTable` when an entry is cut short.
pub fn parse_linking(input: &[u8]) -> Result<Vec<LinkEntry>, FormatError> {
    let mut reader = Reader::new(input, Section::Linking);
    let mut entries = Vec::new();
    while !reader.is_eof() {
        let address = reader.read_u16_be()?;
        let kind = LinkKind::from_u8(reader.read_u8()?);
        let length = usize::from(reader.read_u8()?);
        let name = reader.read_bytes(length)?.to_vec();
        entries.push(LinkEntry {
            address,
            kind,
            name,
        });
    }
    Ok(entries)
}

fn section_slice(
    input: &[u8],
    section: Section,
    offset: u64,
    len: u64,
) -> Result<&[u8], FormatError> {
    let range = usize::try_from(offset).ok().and_then(|begin| {
        let end = begin.checked_add(usize::try_from(len).ok()?)?;
        (end <= input.len()).then_some(begin..end)
    });
    range
        .map(|r| &input[r])
        .ok_or(FormatError::Truncated {
            section,
            offset,
            len,
            file_len: input.len(),
        })
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    section: Section,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8], section: Section) -> Self {
        Self {
            input,
            pos: 0,
            section,
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip(&mut self, size: usize) -> Result<(), FormatError> {
        self.read_bytes(size).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8, FormatError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    fn read_u16_be(&mut self) -> Result<u16, FormatError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32_be(&mut self) -> Result<u32, FormatError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_bytes(&mut self, size: usize) -> Result<&'a [u8], FormatError> {
        if self.pos + size > self.input.len() {
            return Err(self.short_read(size));
        }
        let begin = self.pos;
        self.pos += size;
        Ok(&self.input[begin..self.pos])
    }

    fn short_read(&self, size: usize) -> FormatError {
        match self.section {
            Section::Header | Section::Payload => FormatError::Truncated {
                section: self.section,
                offset: self.pos as u64,
                len: size as u64,
                file_len: self.input.len(),
            },
            Section::Labels | Section::Linking => FormatError::MalformedTable {
                section: self.section,
                at: self.pos,
            },
        }
    }
}
