//! Single-file page allocator (§4.5). Owns the one heap file a database
//! instance has open; page 0 is always the meta page.

use crate::page::{Page, PageType, PAYLOAD_SIZE};
use common::{DbError, DbResult, PAGE_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub struct PageManager {
    file: File,
    next_page_id: u32,
    /// Page ids freed via `free`. The allocator never pops from this list
    /// (§9: free-page reuse is explicitly not adopted in this design).
    free_pages: Vec<u32>,
}

impl PageManager {
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let is_new = !path.exists();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if is_new {
            let meta = Page::new(0, PageType::Meta, "");
            file.write_all(&meta.encode())?;
            file.flush()?;
            return Ok(Self {
                file,
                next_page_id: 1,
                free_pages: Vec::new(),
            });
        }

        let len = file.metadata()?.len();
        let page_count = (len / PAGE_SIZE as u64) as u32;
        let mut free_pages = Vec::new();
        for id in 1..page_count {
            let page = Self::read_at(&mut file, id)?;
            if page.page_type == PageType::Free {
                free_pages.push(id);
            }
        }

        Ok(Self {
            file,
            next_page_id: page_count.max(1),
            free_pages,
        })
    }

    fn read_at(file: &mut File, page_id: u32) -> DbResult<Page> {
        let mut buf = [0u8; PAGE_SIZE];
        file.seek(SeekFrom::Start(page_id as u64 * PAGE_SIZE as u64))?;
        file.read_exact(&mut buf)?;
        Page::decode(&buf)
    }

    /// Appends a new page at the next free id and writes it to disk
    /// immediately.
    pub fn allocate(&mut self, page_type: PageType, table_name: &str) -> DbResult<u32> {
        let id = self.next_page_id;
        self.next_page_id += 1;
        let page = Page::new(id, page_type, table_name);
        self.write(id, &page)?;
        Ok(id)
    }

    /// Marks a page as free. The id is retained on a free list but never
    /// recycled by this allocator.
    pub fn free(&mut self, page_id: u32) -> DbResult<()> {
        let mut page = self.read(page_id)?;
        page.reset_as_free();
        self.write(page_id, &page)?;
        self.free_pages.push(page_id);
        Ok(())
    }

    pub fn read(&mut self, page_id: u32) -> DbResult<Page> {
        Self::read_at(&mut self.file, page_id)
    }

    pub fn write(&mut self, page_id: u32, page: &Page) -> DbResult<()> {
        self.file.seek(SeekFrom::Start(page_id as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(&page.encode())?;
        Ok(())
    }

    pub fn sync(&mut self) -> DbResult<()> {
        self.file.flush()?;
        Ok(())
    }

    pub fn next_page_id(&self) -> u32 {
        self.next_page_id
    }

    pub fn free_page_ids(&self) -> &[u32] {
        &self.free_pages
    }

    /// Scans all allocated pages (1..next_page_id), used during catalog and
    /// table store bootstrap to rediscover which pages belong to which
    /// table after a reopen.
    pub fn scan_allocated(&mut self) -> DbResult<Vec<Page>> {
        let mut pages = Vec::new();
        for id in 1..self.next_page_id {
            pages.push(self.read(id)?);
        }
        Ok(pages)
    }
}

/// Validates that `free_space` and `payload.len()` always agree — a thin
/// sanity check used by table store bootstrap after reading a page back.
pub fn assert_page_consistent(page: &Page) -> DbResult<()> {
    if page.payload.len() != PAYLOAD_SIZE {
        return Err(DbError::Storage(format!(
            "page {} payload length {} does not match expected {PAYLOAD_SIZE}",
            page.page_id,
            page.payload.len()
        )));
    }
    Ok(())
}
