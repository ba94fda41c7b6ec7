use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::storage::page::{PageId, PAGE_SIZE};
use crate::storage::Disk;

/// A single-file disk. Page `i` lives at byte offset `i * PAGE_SIZE`; the
/// file grows on demand as higher ids are written. Reads past the current
/// end of file zero-fill the tail, so a page that was allocated but never
/// written behaves like the memory disk.
#[derive(Debug)]
pub struct FileDisk {
    file: File,
}

impl FileDisk {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FileDisk> {
        let file = OpenOptions::new().read(true).write(true).create(true).open(path)?;
        Ok(FileDisk { file })
    }

    fn offset(page_id: PageId) -> Result<u64> {
        // rejects the invalid sentinel and any other negative id
        let id = u64::try_from(page_id)?;
        Ok(id * PAGE_SIZE as u64)
    }
}

impl Disk for FileDisk {
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        if buf.len() != PAGE_SIZE {
            return Err(Error::value(format!("page buffer of {} bytes", buf.len())));
        }
        self.file.seek(SeekFrom::Start(Self::offset(page_id)?))?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                debug!("short read of page {}, zero filling {} bytes", page_id, buf.len() - filled);
                buf[filled..].fill(0);
                break;
            }
            filled += n;
        }
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        if data.len() != PAGE_SIZE {
            return Err(Error::value(format!("page buffer of {} bytes", data.len())));
        }
        self.file.seek(SeekFrom::Start(Self::offset(page_id)?))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }
}
