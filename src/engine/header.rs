//! MDX header metadata
//!
//! ```text
//! [4 bytes] Header length (big-endian u32)
//! [N bytes] XML attributes (UTF-16LE for v1/v2, UTF-8 for v3)
//! [4 bytes] Adler32 checksum (little-endian u32)
//! ```
//!
//! Only the attributes are read; key and record blocks are never touched.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use adler2::adler32_slice;
use encoding_rs::UTF_16LE;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

/// Headers larger than this are treated as corrupt
const MAX_HEADER_LEN: u32 = 1024 * 1024;

/// Errors reading an MDX header
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Implausible header length {0}")]
    Length(u32),

    #[error("Header checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Checksum { expected: u32, actual: u32 },

    #[error("Malformed header XML: {0}")]
    Xml(String),
}

/// Metadata attributes of an MDX header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictHeader {
    pub title: Option<String>,
    pub description: Option<String>,
    pub engine_version: Option<String>,
    pub encoding: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl DictHeader {
    /// Read and verify the header of an `.mdx` file
    pub fn read(path: &Path) -> Result<Self, HeaderError> {
        let mut file = File::open(path)?;

        let mut len = [0u8; 4];
        file.read_exact(&mut len)?;
        let len = u32::from_be_bytes(len);
        if len == 0 || len > MAX_HEADER_LEN {
            return Err(HeaderError::Length(len));
        }

        let mut bytes = vec![0u8; len as usize];
        file.read_exact(&mut bytes)?;

        let mut checksum = [0u8; 4];
        file.read_exact(&mut checksum)?;
        let expected = u32::from_le_bytes(checksum);
        let actual = adler32_slice(&bytes);
        if expected != actual {
            return Err(HeaderError::Checksum { expected, actual });
        }

        Self::parse(&bytes)
    }

    /// Parse raw header bytes (without length prefix and checksum)
    pub fn parse(bytes: &[u8]) -> Result<Self, HeaderError> {
        let text = if let Some(utf16) = bytes.strip_suffix(&[0, 0]) {
            let (decoded, _, _) = UTF_16LE.decode(utf16);
            decoded.into_owned()
        } else {
            String::from_utf8_lossy(bytes).into_owned()
        };

        // Some generators leave control bytes inside attribute values.
        let text: String = text
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect();

        let attributes = root_attributes(&text)?;
        let non_empty = |key: &str| attributes.get(key).filter(|v| !v.trim().is_empty()).cloned();

        Ok(Self {
            title: non_empty("Title"),
            description: non_empty("Description"),
            engine_version: non_empty("GeneratedByEngineVersion"),
            encoding: non_empty("Encoding"),
            attributes,
        })
    }
}

/// Unescaped attributes of the first element
fn root_attributes(xml: &str) -> Result<BTreeMap<String, String>, HeaderError> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return e
                    .attributes()
                    .map(|attr| {
                        let attr = attr.map_err(|e| HeaderError::Xml(e.to_string()))?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                        let value = attr
                            .unescape_value()
                            .map_err(|e| HeaderError::Xml(e.to_string()))?
                            .into_owned();
                        Ok((key, value))
                    })
                    .collect();
            }
            Ok(Event::Eof) => return Err(HeaderError::Xml("no root element".to_string())),
            Err(e) => return Err(HeaderError::Xml(e.to_string())),
            _ => {}
        }
    }
}
