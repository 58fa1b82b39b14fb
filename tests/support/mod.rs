//! Builder for synthetic documents.

#![allow(dead_code)]

use fitfile::sans::check::compute;
use tracing_subscriber::EnvFilter;

/// Print decoder logs, filtered by `RUST_LOG`, with test output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A document under construction. Record bytes are appended in order, and the
/// header and CRCs are filled in by [`Document::build`].
#[derive(Debug, Clone)]
pub struct Document {
    header_size: u8,
    header_checksum: Option<u16>,
    protocol_version: u8,
    profile_version: u16,
    data_size: Option<u32>,
    records: Vec<u8>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            header_size: 12,
            header_checksum: None,
            protocol_version: 0x20,
            profile_version: 2132,
            data_size: None,
            records: Vec::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fourteen-byte header with a calculated CRC.
    pub fn extended(mut self) -> Self {
        self.header_size = 14;
        self
    }

    /// Use a header of any size of at least fourteen bytes, with a stored CRC
    /// (calculated if `None`).
    pub fn header_size(mut self, size: u8, checksum: Option<u16>) -> Self {
        self.header_size = size;
        self.header_checksum = checksum;
        self
    }

    pub fn versions(mut self, protocol: u8, profile: u16) -> Self {
        self.protocol_version = protocol;
        self.profile_version = profile;
        self
    }

    /// Declare a data size other than the length of the records.
    pub fn data_size(mut self, size: u32) -> Self {
        self.data_size = Some(size);
        self
    }

    /// Append a little-endian definition record of `(number, size, base type)`
    /// fields.
    pub fn definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, 1, global, fields, None)
    }

    /// Append a definition record with an architecture byte (zero for
    /// big-endian) and optional `(number, size, developer data index)`
    /// developer fields.
    pub fn definition_with(
        mut self,
        local: u8,
        architecture: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer: Option<&[(u8, u8, u8)]>,
    ) -> Self {
        let flag = if developer.is_some() { 0xE0 } else { 0xC0 };
        let global = if architecture == 0 {
            global.to_be_bytes()
        } else {
            global.to_le_bytes()
        };

        self.records.push(flag | local);
        self.records.extend([0, architecture, global[0], global[1]]);
        self.records.push(fields.len() as u8);
        for &(number, size, base_type) in fields {
            self.records.extend([number, size, base_type]);
        }

        if let Some(developer) = developer {
            self.records.push(developer.len() as u8);
            for &(number, size, index) in developer {
                self.records.extend([number, size, index]);
            }
        }

        self
    }

    /// Append a data record with a normal header.
    pub fn data(mut self, local: u8, body: &[u8]) -> Self {
        self.records.push(0x80 | local);
        self.records.extend_from_slice(body);
        self
    }

    /// Append a data record with a compressed timestamp header.
    pub fn compressed(mut self, local: u8, time_offset: u8, body: &[u8]) -> Self {
        self.records.push((local & 0x03) << 5 | (time_offset & 0x1F));
        self.records.extend_from_slice(body);
        self
    }

    /// Append arbitrary record bytes.
    pub fn raw(mut self, r: &[u8]) -> Self {
        self.records.extend_from_slice(r);
        self
    }

    pub fn header(&self) -> Vec<u8> {
        let data_size = self.data_size.unwrap_or(self.records.len() as u32);

        let mut r = vec![self.header_size, self.protocol_version];
        r.extend(self.profile_version.to_le_bytes());
        r.extend(data_size.to_le_bytes());
        r.extend(b".FIT");

        if self.header_size >= 14 {
            let checksum = self.header_checksum.unwrap_or_else(|| compute(&r));
            r.extend(checksum.to_le_bytes());
            r.resize(usize::from(self.header_size), 0);
        }

        r
    }

    /// The header and records, without the file CRC.
    pub fn body(&self) -> Vec<u8> {
        let mut r = self.header();
        r.extend_from_slice(&self.records);
        r
    }

    /// The complete document, including the file CRC.
    pub fn build(&self) -> Vec<u8> {
        let mut r = self.body();
        let checksum = compute(&r);
        r.extend(checksum.to_le_bytes());
        r
    }
}
