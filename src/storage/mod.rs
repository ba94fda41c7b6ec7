use std::fmt::Debug;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::storage::page::PageId;

pub mod buffer;
pub mod file;
pub mod memory;
pub mod page;

/// A synchronous block device addressed by page id, where every block is
/// exactly PAGE_SIZE bytes. The buffer pool is the only caller; it hands in
/// page-sized buffers and expects the call to have completed against the
/// medium when it returns.
///
/// A page that has never been written reads back as all zeroes, so callers
/// need not track which ids have been materialized.
pub trait Disk: Debug + Send + Sync {
    /// Fill `buf` with the on-disk content of the page.
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()>;

    /// Persist `data` as the content of the page.
    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()>;
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskType {
    Memory,
    File,
}

/// Build a disk of the given type. `path` names the backing file for
/// DiskType::File and is ignored for DiskType::Memory.
pub fn new_disk(typ: DiskType, path: &Path) -> Result<Box<dyn Disk>> {
    match typ {
        DiskType::Memory => Ok(Box::new(memory::MemoryDisk::new())),
        DiskType::File => Ok(Box::new(file::FileDisk::open(path)?)),
    }
}
