use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::storage::page::{PageId, PAGE_SIZE};
use crate::storage::Disk;

/// An in-memory disk keyed by page id, mainly for tests and tooling.
/// Pages that were never written read back as zeroes.
#[derive(Debug, Default)]
pub struct MemoryDisk {
    pages: BTreeMap<PageId, Vec<u8>>,
}

impl MemoryDisk {
    pub fn new() -> MemoryDisk {
        MemoryDisk { pages: BTreeMap::new() }
    }
}

impl Disk for MemoryDisk {
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        if buf.len() != PAGE_SIZE {
            return Err(Error::value(format!("page buffer of {} bytes", buf.len())));
        }
        match self.pages.get(&page_id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        if data.len() != PAGE_SIZE {
            return Err(Error::value(format!("page buffer of {} bytes", data.len())));
        }
        self.pages.insert(page_id, data.to_vec());
        Ok(())
    }
}
