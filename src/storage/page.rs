use std::ops::Deref;
use std::sync::RwLock;

/// Identifier of a data page. Ids are handed out by a monotonic allocator
/// and are never recycled within the lifetime of a pool; a 64-bit id space
/// makes that acceptable.
pub type PageId = i64;

/// Size of a data page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel id naming "no page". Valid page ids are nonnegative.
pub const INVALID_PAGE_ID: PageId = -1;

/// The actual page data that include in-memory metadata
/// like dirty bit and pin count etc. and the data on storage.
pub struct PageData {
    pub id: PageId,
    /// Always exactly PAGE_SIZE bytes.
    pub data: Vec<u8>,
    /// Whether the in-memory content has diverged from the on-disk image.
    pub is_dirty: bool,
    /// Number of outstanding callers holding this page.
    pub pin_count: i32,
}

impl PageData {
    fn new() -> Self {
        Self {
            id: INVALID_PAGE_ID,
            data: vec![0; PAGE_SIZE],
            is_dirty: false,
            pin_count: 0,
        }
    }

    /// Reset to the unused state: invalid id, clean, unpinned, zeroed data.
    pub fn reset(&mut self) {
        self.id = INVALID_PAGE_ID;
        self.is_dirty = false;
        self.pin_count = 0;
        self.data.fill(0);
    }
}

/// Page act as the container of the actual page data for
/// providing concurrent access protection.
pub struct Page {
    inner: RwLock<PageData>,
}

impl Page {
    /// Allocate a page frame in memory with PAGE_SIZE zeroed bytes and
    /// unused metadata.
    pub fn new() -> Self {
        Page { inner: RwLock::new(PageData::new()) }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

impl Deref for Page {
    type Target = RwLock<PageData>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    #[test]
    fn test_reset() -> Result<()> {
        let page = Page::new();
        let mut guard = page.write()?;
        guard.id = 7;
        guard.pin_count = 2;
        guard.is_dirty = true;
        guard.data[0] = 0xab;

        guard.reset();
        assert_eq!(INVALID_PAGE_ID, guard.id);
        assert_eq!(0, guard.pin_count);
        assert!(!guard.is_dirty);
        assert_eq!(PAGE_SIZE, guard.data.len());
        assert!(guard.data.iter().all(|&b| b == 0));
        Ok(())
    }
}
