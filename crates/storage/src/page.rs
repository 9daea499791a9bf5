//! Fixed-size page layout: an 80-byte header followed by a packed sequence
//! of records with no slot directory. A scan reparses the payload
//! sequentially using the record codec, stopping after `record_count`
//! records or when `free_space` is exhausted.

use common::{DbError, DbResult, PAGE_SIZE};

pub const HEADER_SIZE: usize = 80;
pub const PAYLOAD_SIZE: usize = PAGE_SIZE - HEADER_SIZE;

const PAGE_TYPE_LEN: usize = 32;
const TABLE_NAME_LEN: usize = 32;

/// The three page roles. Stored on disk as a NUL-padded ASCII string so the
/// on-disk format stays self-describing without a separate catalog lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageType {
    Meta,
    Data,
    Free,
}

impl PageType {
    fn as_str(self) -> &'static str {
        match self {
            PageType::Meta => "meta",
            PageType::Data => "data",
            PageType::Free => "free",
        }
    }

    fn parse(s: &str) -> DbResult<PageType> {
        match s {
            "meta" => Ok(PageType::Meta),
            "data" => Ok(PageType::Data),
            "free" => Ok(PageType::Free),
            other => Err(DbError::Storage(format!("unknown page type '{other}'"))),
        }
    }
}

/// One 4096-byte page: header plus packed record payload.
#[derive(Clone, Debug)]
pub struct Page {
    pub page_id: u32,
    pub page_type: PageType,
    pub table_name: String,
    pub record_count: u32,
    pub free_space: u32,
    pub next_page: i32,
    pub payload: Vec<u8>,
}

impl Page {
    pub fn new(page_id: u32, page_type: PageType, table_name: impl Into<String>) -> Self {
        Self {
            page_id,
            page_type,
            table_name: table_name.into(),
            record_count: 0,
            free_space: PAYLOAD_SIZE as u32,
            next_page: -1,
            payload: vec![0u8; PAYLOAD_SIZE],
        }
    }

    /// Byte offset within the page (including the header) at which the next
    /// record would be appended.
    pub fn write_offset(&self) -> usize {
        HEADER_SIZE + (PAYLOAD_SIZE - self.free_space as usize)
    }

    pub fn can_fit(&self, encoded_len: usize) -> bool {
        encoded_len <= self.free_space as usize
    }

    /// Appends `bytes` at the current write offset and updates the header
    /// counters. Caller must have checked `can_fit` first.
    pub fn append_record(&mut self, bytes: &[u8]) -> DbResult<u32> {
        if !self.can_fit(bytes.len()) {
            return Err(DbError::Storage(format!(
                "record of {} bytes does not fit in {} remaining on page {}",
                bytes.len(),
                self.free_space,
                self.page_id
            )));
        }
        let offset_in_payload = PAYLOAD_SIZE - self.free_space as usize;
        self.payload[offset_in_payload..offset_in_payload + bytes.len()].copy_from_slice(bytes);
        self.free_space -= bytes.len() as u32;
        self.record_count += 1;
        Ok((HEADER_SIZE + offset_in_payload) as u32)
    }

    /// Resets the payload to empty and re-serializes `records` (already
    /// encoded) contiguously from the start — used to compact a page after
    /// UPDATE/DELETE. Returns the byte offset (header-relative) of each
    /// record as it is re-written, for index refresh.
    pub fn rewrite(&mut self, records: &[Vec<u8>]) -> DbResult<Vec<u32>> {
        self.payload = vec![0u8; PAYLOAD_SIZE];
        self.record_count = 0;
        self.free_space = PAYLOAD_SIZE as u32;
        let mut offsets = Vec::with_capacity(records.len());
        for bytes in records {
            offsets.push(self.append_record(bytes)?);
        }
        Ok(offsets)
    }

    pub fn reset_as_free(&mut self) {
        self.page_type = PageType::Free;
        self.table_name.clear();
        self.record_count = 0;
        self.free_space = PAYLOAD_SIZE as u32;
        self.next_page = -1;
        self.payload = vec![0u8; PAYLOAD_SIZE];
    }

    pub fn encode(&self) -> [u8; PAGE_SIZE] {
        let mut buf = [0u8; PAGE_SIZE];
        buf[0..4].copy_from_slice(&self.page_id.to_be_bytes());

        let type_bytes = self.page_type.as_str().as_bytes();
        buf[4..4 + type_bytes.len()].copy_from_slice(type_bytes);

        let name_bytes = self.table_name.as_bytes();
        let name_len = name_bytes.len().min(TABLE_NAME_LEN);
        buf[36..36 + name_len].copy_from_slice(&name_bytes[..name_len]);

        buf[68..72].copy_from_slice(&self.record_count.to_be_bytes());
        buf[72..76].copy_from_slice(&self.free_space.to_be_bytes());
        buf[76..80].copy_from_slice(&self.next_page.to_be_bytes());
        buf[HEADER_SIZE..].copy_from_slice(&self.payload);
        buf
    }

    pub fn decode(buf: &[u8; PAGE_SIZE]) -> DbResult<Page> {
        let page_id = u32::from_be_bytes(buf[0..4].try_into().unwrap());
        let page_type = PageType::parse(trim_nul(&buf[4..4 + PAGE_TYPE_LEN]))?;
        let table_name = trim_nul(&buf[36..36 + TABLE_NAME_LEN]).to_string();
        let record_count = u32::from_be_bytes(buf[68..72].try_into().unwrap());
        let free_space = u32::from_be_bytes(buf[72..76].try_into().unwrap());
        let next_page = i32::from_be_bytes(buf[76..80].try_into().unwrap());
        let payload = buf[HEADER_SIZE..].to_vec();

        Ok(Page {
            page_id,
            page_type,
            table_name,
            record_count,
            free_space,
            next_page,
            payload,
        })
    }
}

fn trim_nul(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}
