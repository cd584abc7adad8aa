use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("not a valid LC-3 object file")]
    NotAnObjectFile,
    #[error("major version {major} not supported (object file version {major}.{minor})")]
    UnsupportedVersion { major: u8, minor: u8 },
    #[error(
        "{section} at offset {offset:#010x} with {len} byte(s) runs past end of file ({file_len} bytes)"
    )]
    Truncated {
        section: Section,
        offset: u64,
        len: u64,
        file_len: usize,
    },
    #[error("malformed {section} entry at byte {at}")]
    MalformedTable { section: Section, at: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Payload,
    Labels,
    Linking,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Payload => "payload",
            Self::Labels => "label table",
            Self::Linking => "linking table",
        };
        f.write_str(name)
    }
}

pub mod obj;
