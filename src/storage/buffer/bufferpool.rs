use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::debug;

use crate::error::{Error, Result};
use crate::storage::buffer::hashtable::ExtendibleHashTable;
use crate::storage::buffer::replacer::SyncLRUKReplacer;
use crate::storage::buffer::{FrameId, Replacer};
use crate::storage::page::{Page, PageId, INVALID_PAGE_ID};
use crate::storage::Disk;

/// Entries per page table bucket before a split.
const PAGE_TABLE_BUCKET_SIZE: usize = 4;

/// The buffer pool is responsible for moving physical pages back and forth
/// between main memory and disk, so the system above it can address more
/// pages than fit in the configured number of frames.
///
/// The pool's operations are transparent to other parts in the system: a
/// caller asks for a page by its unique id and does not know whether that
/// page is already in memory or has to be read from disk first.
struct BufferPool {
    pool_size: usize,
    /// the disk this pool caches.
    disk: Box<dyn Disk>,
    /// array of buffer pool pages. the array index is the FrameId,
    /// i.e. FrameId is in range [0, pool_size).
    pages: Vec<Arc<Page>>,
    /// page table mapping resident page ids to their frames.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// frames that currently hold no page.
    free_list: VecDeque<FrameId>,
    /// replacer to find unpinned pages for replacement.
    replacer: Arc<dyn Replacer>,
    /// the next page id to be allocated.
    next_page_id: PageId,
}

impl BufferPool {
    fn new(disk: Box<dyn Disk>, pool_size: usize, replacer_k: usize) -> Self {
        let mut pages = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);
        let page_table = ExtendibleHashTable::new(PAGE_TABLE_BUCKET_SIZE);
        let replacer: Arc<dyn Replacer> = Arc::new(SyncLRUKReplacer::new(replacer_k, pool_size));
        for i in 0..pool_size {
            pages.push(Arc::new(Page::new()));
            // initially, every frame is in the free list
            free_list.push_back(i);
        }
        BufferPool { pool_size, disk, pages, page_table, free_list, replacer, next_page_id: 0 }
    }

    /// Pick a frame to hold an incoming page: prefer the free list, fall
    /// back to evicting. An evicted dirty page is written back before its
    /// frame is handed out, and its page table entry is dropped.
    fn available_frame(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.pop_front() {
            return Ok(frame_id);
        }
        let frame_id = self.replacer.evict().ok_or(Error::PoolExhausted)?;
        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        if guard.is_dirty {
            debug!("writing back page {} evicted from frame {}", guard.id, frame_id);
            self.disk.write_page(guard.id, &guard.data)?;
        }
        self.page_table.remove(&guard.id);
        Ok(frame_id)
    }

    /// Create a new page in the buffer pool, pinned and zeroed. The page is
    /// born dirty so its id is materialized on disk at the latest when the
    /// frame is evicted, even if the caller never writes a byte.
    fn new_page(&mut self) -> Result<Arc<Page>> {
        let frame_id = self.available_frame()?;
        let page_id = self.allocate_page();

        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        guard.reset();
        guard.id = page_id;
        guard.pin_count = 1;
        guard.is_dirty = true;
        drop(guard);

        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);
        Ok(page)
    }

    /// Fetch the page with the given id, pinning it. A resident page is a
    /// pure in-memory hit; otherwise a frame is acquired as in new_page and
    /// the page content is read from disk.
    fn fetch_page(&mut self, page_id: PageId) -> Result<Arc<Page>> {
        if let Some(frame_id) = self.page_table.find(&page_id) {
            let page = Arc::clone(&self.pages[frame_id]);
            page.write()?.pin_count += 1;
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            return Ok(page);
        }

        let frame_id = self.available_frame()?;
        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        guard.reset();
        guard.id = page_id;
        guard.pin_count = 1;
        self.disk.read_page(page_id, &mut guard.data)?;
        drop(guard);

        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);
        Ok(page)
    }

    /// Drop one pin on the page. Returns false if the page is not resident
    /// or its pin count is already zero. The dirty flag is sticky: a clean
    /// unpin never hides an earlier dirty one.
    fn unpin_page(&mut self, page_id: PageId, is_dirty: bool) -> bool {
        let frame_id = match self.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return false,
        };
        let page = &self.pages[frame_id];
        let mut guard = page.write().unwrap();
        if guard.pin_count == 0 {
            return false;
        }
        guard.pin_count -= 1;
        guard.is_dirty = guard.is_dirty || is_dirty;
        if guard.pin_count == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Write the page to disk regardless of the dirty flag and mark it
    /// clean. Flushing does not unpin. Returns false if the page is not
    /// resident.
    fn flush_page(&mut self, page_id: PageId) -> Result<bool> {
        let frame_id = match self.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return Ok(false),
        };
        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        self.disk.write_page(guard.id, &guard.data)?;
        guard.is_dirty = false;
        Ok(true)
    }

    /// Flush every resident page in the buffer pool to disk.
    fn flush_all_pages(&mut self) -> Result<()> {
        for frame_id in 0..self.pool_size {
            let page = Arc::clone(&self.pages[frame_id]);
            let mut guard = page.write()?;
            if guard.id == INVALID_PAGE_ID {
                continue;
            }
            self.disk.write_page(guard.id, &guard.data)?;
            guard.is_dirty = false;
        }
        Ok(())
    }

    /// Delete a page from the buffer pool. A non-resident page is a no-op
    /// and returns true; a pinned page cannot be deleted and returns false.
    /// Otherwise the frame is unmapped, reset, untracked by the replacer
    /// and returned to the free list. Dirty data is discarded, the caller
    /// asserts the page is defunct.
    fn delete_page(&mut self, page_id: PageId) -> Result<bool> {
        let frame_id = match self.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return Ok(true),
        };
        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        if guard.pin_count > 0 {
            return Ok(false);
        }
        self.page_table.remove(&page_id);
        guard.reset();
        drop(guard);
        self.replacer.remove(frame_id);
        self.free_list.push_back(frame_id);
        self.deallocate_page(page_id);
        Ok(true)
    }

    fn allocate_page(&mut self) -> PageId {
        let page_id = self.next_page_id;
        self.next_page_id += 1;
        page_id
    }

    /// Page ids are not recycled; the 64-bit id space outlives any pool.
    fn deallocate_page(&mut self, _page_id: PageId) {}
}

/// Buffer pool manager wraps the buffer pool with a mutex for concurrent
/// access, basically all the heavy lifting happens in the buffer pool. The
/// mutex is held for the full duration of every operation, disk I/O
/// included, so evictions cannot race with fetches for the same frame.
pub struct BufferPoolManager {
    inner: Arc<Mutex<BufferPool>>,
}

impl BufferPoolManager {
    pub fn new(disk: Box<dyn Disk>, pool_size: usize, replacer_k: usize) -> Self {
        let inner = BufferPool::new(disk, pool_size, replacer_k);
        BufferPoolManager { inner: Arc::new(Mutex::new(inner)) }
    }

    /// Create a new page in the buffer pool, pinned and zeroed.
    pub fn new_page(&self) -> Result<Arc<Page>> {
        let mut inner = self.inner.lock()?;
        inner.new_page()
    }

    /// Fetch the page with the given id from the buffer pool, pinning it.
    pub fn fetch_page(&self, page_id: PageId) -> Result<Arc<Page>> {
        let mut inner = self.inner.lock()?;
        inner.fetch_page(page_id)
    }

    /// Drop one pin on the page, marking it dirty if the caller modified
    /// it. Returns false if the page is not resident or not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.unpin_page(page_id, is_dirty)
    }

    /// Write the page to disk regardless of the dirty flag and mark it
    /// clean.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let mut inner = self.inner.lock()?;
        inner.flush_page(page_id)
    }

    /// Flush every resident page to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.flush_all_pages()
    }

    /// Delete a page from the buffer pool. Idempotent for non-resident
    /// ids; refuses pinned pages.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut inner = self.inner.lock()?;
        inner.delete_page(page_id)
    }
}
