use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::Path,
};

use tracing::debug;

use crate::{DbError, PAGE_DATA_SIZE, PAGE_SIZE, ROW_SIZE, ROWS_PER_PAGE, Result};

pub type Page = [u8; PAGE_SIZE];

struct CachedPage {
    data: Box<Page>,
    dirty: bool,
}

/// Mediates between the backing file and an in-memory array of pages.
///
/// Pages are loaded lazily on first access and stay resident until [`Pager::close`]. Only pages
/// written through [`Pager::get_page_mut`] are flushed back.
pub struct Pager {
    file: File,
    file_length: u64,
    pages: Vec<Option<CachedPage>>,
    max_pages: Option<usize>,
}

impl Pager {
    /// Opens `path` for reading and writing, creating it when absent.
    pub fn open<P: AsRef<Path>>(path: P, max_pages: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_length = file.metadata()?.len();
        debug!(path = %path.display(), file_length, "opened pager");

        Ok(Self {
            file,
            file_length,
            pages: Vec::new(),
            max_pages,
        })
    }

    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Pages covered by the file, counting a trailing partial page.
    pub fn num_pages(&self) -> usize {
        self.file_length.div_ceil(PAGE_DATA_SIZE as u64) as usize
    }

    pub fn resident_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        matches!(self.pages.get(index), Some(Some(page)) if page.dirty)
    }

    pub fn get_page(&mut self, index: usize) -> Result<&Page> {
        Ok(&*self.load(index)?.data)
    }

    /// Like [`Pager::get_page`], but marks the page dirty so it is written back on close.
    pub fn get_page_mut(&mut self, index: usize) -> Result<&mut Page> {
        let page = self.load(index)?;
        page.dirty = true;
        Ok(&mut *page.data)
    }

    fn load(&mut self, index: usize) -> Result<&mut CachedPage> {
        if let Some(max_pages) = self.max_pages {
            if index >= max_pages {
                return Err(DbError::PageOutOfBounds {
                    page: index,
                    max_pages,
                });
            }
        }

        if self.pages.len() <= index {
            self.pages.resize_with(index + 1, || None);
        }

        if self.pages[index].is_none() {
            let mut data = Box::new([0u8; PAGE_SIZE]);
            if index < self.num_pages() {
                self.file.seek(SeekFrom::Start(page_offset(index)))?;
                let read = read_up_to(&mut self.file, &mut data[..PAGE_DATA_SIZE])?;
                debug!(page = index, bytes = read, "loaded page from disk");
            } else {
                debug!(page = index, "allocated fresh page");
            }
            self.pages[index] = Some(CachedPage { data, dirty: false });
        }

        self.pages[index]
            .as_mut()
            .ok_or(DbError::PageNotLoaded(index))
    }

    /// Writes the first `byte_count` bytes of a resident page to its place in the file. Counts past
    /// the row area of the page are clamped to it.
    pub fn flush(&mut self, index: usize, byte_count: usize) -> Result<()> {
        let page = self
            .pages
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(DbError::PageNotLoaded(index))?;
        let byte_count = byte_count.min(PAGE_DATA_SIZE);
        let offset = page_offset(index);

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&page.data[..byte_count])?;
        page.dirty = false;

        self.file_length = self.file_length.max(offset + byte_count as u64);
        debug!(page = index, bytes = byte_count, "flushed page");
        Ok(())
    }

    /// Flushes every dirty page holding part of the first `row_count` rows. The last page is
    /// written only up to its final occupied row, so the file ends exactly after that row.
    pub fn flush_all(&mut self, row_count: usize) -> Result<()> {
        let full_pages = row_count / ROWS_PER_PAGE;
        for index in 0..full_pages {
            if self.is_dirty(index) {
                self.flush(index, PAGE_DATA_SIZE)?;
            }
        }

        let additional_rows = row_count % ROWS_PER_PAGE;
        if additional_rows > 0 && self.is_dirty(full_pages) {
            self.flush(full_pages, additional_rows * ROW_SIZE)?;
        }

        self.file.sync_all()?;
        Ok(())
    }

    /// Flushes and then releases every page buffer. The file handle is released on drop.
    pub fn close(&mut self, row_count: usize) -> Result<()> {
        self.flush_all(row_count)?;
        self.pages.clear();
        Ok(())
    }

    pub(crate) fn set_len(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.file_length = len;
        Ok(())
    }
}

fn page_offset(index: usize) -> u64 {
    index as u64 * PAGE_DATA_SIZE as u64
}

// A short read at the end of the file is expected; the rest of the buffer stays zeroed.
fn read_up_to(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
