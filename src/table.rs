use std::path::Path;

use tracing::{error, info, warn};

use crate::{
    Config, Cursor, DbError, Pager, ROW_SIZE, ROWS_PER_PAGE, Result, Row, TrailingBytes,
};

/// The single table of a database file: a [`Pager`] plus the number of rows stored in it.
///
/// The row count is recovered from the file length on open and only grows afterwards. Rows reach
/// the disk on [`Table::close`]; a table dropped without being closed flushes on a best-effort
/// basis.
pub struct Table {
    pager: Pager,
    row_count: usize,
    max_rows: Option<usize>,
    closed: bool,
}

impl Table {
    pub fn open<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let mut pager = Pager::open(path, config.max_pages)?;

        let file_length = pager.file_length();
        let trailing = file_length % ROW_SIZE as u64;
        if trailing != 0 {
            match config.trailing_bytes {
                TrailingBytes::Reject => {
                    return Err(DbError::MalformedFile {
                        len: file_length,
                        row_size: ROW_SIZE,
                    });
                }
                TrailingBytes::Truncate => {
                    warn!(
                        path = %path.display(),
                        trailing,
                        "truncating partial row at end of file"
                    );
                    pager.set_len(file_length - trailing)?;
                }
            }
        }

        let row_count = (pager.file_length() / ROW_SIZE as u64) as usize;
        if let Some(max_pages) = config.max_pages {
            let pages = row_count.div_ceil(ROWS_PER_PAGE);
            if pages > max_pages {
                return Err(DbError::PageOutOfBounds {
                    page: pages - 1,
                    max_pages,
                });
            }
        }

        info!(path = %path.display(), row_count, "opened table");
        Ok(Self {
            pager,
            row_count,
            max_rows: config.max_rows(),
            closed: false,
        })
    }

    pub fn open_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, &Config::default())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.max_rows
    }

    pub fn is_full(&self) -> bool {
        self.max_rows.is_some_and(|max| self.row_count >= max)
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Bytes of the stored row at `index`.
    pub fn row_slot(&mut self, index: usize) -> Result<&[u8]> {
        if index >= self.row_count {
            return Err(DbError::RowOutOfBounds {
                row: index,
                row_count: self.row_count,
            });
        }
        let page = self.pager.get_page(index / ROWS_PER_PAGE)?;
        let offset = (index % ROWS_PER_PAGE) * ROW_SIZE;
        Ok(&page[offset..offset + ROW_SIZE])
    }

    /// Bytes of the next free row. The row count is left alone until the caller has written it.
    pub fn append_slot(&mut self) -> Result<&mut [u8]> {
        if let Some(max_rows) = self.max_rows {
            if self.row_count >= max_rows {
                return Err(DbError::TableFull { max_rows });
            }
        }
        let index = self.row_count;
        let page = self.pager.get_page_mut(index / ROWS_PER_PAGE)?;
        let offset = (index % ROWS_PER_PAGE) * ROW_SIZE;
        Ok(&mut page[offset..offset + ROW_SIZE])
    }

    /// Appends `row` after the last stored row. Fails with [`DbError::TableFull`] at capacity.
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        {
            let mut cursor = Cursor::end(self);
            row.serialize(cursor.value_mut()?);
        }
        self.row_count += 1;
        Ok(())
    }

    /// Every stored row in insertion order. Each call starts a fresh scan.
    pub fn select(&mut self) -> Rows<'_> {
        Rows {
            cursor: Cursor::start(self),
            failed: false,
        }
    }

    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.pager.close(self.row_count)?;
        info!(row_count = self.row_count, "closed table");
        Ok(())
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.pager.close(self.row_count) {
            error!("failed to flush table on drop: {}", e);
        }
    }
}

/// Lazy scan over a table, yielding decoded rows.
pub struct Rows<'a> {
    cursor: Cursor<'a>,
    failed: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.end_of_table() {
            return None;
        }
        match self.cursor.value().map(Row::deserialize) {
            Ok(row) => {
                self.cursor.advance();
                Some(Ok(row))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::{ErrorKind, PAGE_DATA_SIZE};

    fn user(id: u32) -> Row {
        Row::new(id, format!("user{id}"), format!("person{id}@example.com")).unwrap()
    }

    fn small_config(pages: usize) -> Config {
        Config::builder().max_pages(pages).build()
    }

    #[test]
    fn empty_file_has_no_rows() {
        let file = NamedTempFile::new().unwrap();
        let mut table = Table::open_default(file.path()).unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.select().count(), 0);
    }

    #[test]
    fn select_returns_rows_in_insertion_order() {
        let file = NamedTempFile::new().unwrap();
        let mut table = Table::open_default(file.path()).unwrap();
        for id in [3, 1, 2] {
            table.insert(&user(id)).unwrap();
        }

        let ids: Vec<u32> = table.select().map(|r| r.unwrap().id()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        // restartable
        assert_eq!(table.select().count(), 3);
    }

    #[test]
    fn duplicate_ids_are_stored() {
        let file = NamedTempFile::new().unwrap();
        let mut table = Table::open_default(file.path()).unwrap();
        table.insert(&user(1)).unwrap();
        table.insert(&user(1)).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn insert_is_refused_at_capacity() {
        let file = NamedTempFile::new().unwrap();
        let mut table = Table::open(file.path(), &small_config(1)).unwrap();
        for id in 0..ROWS_PER_PAGE as u32 {
            table.insert(&user(id)).unwrap();
        }
        assert!(table.is_full());

        let err = table.insert(&user(99)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert_eq!(table.row_count(), ROWS_PER_PAGE);
    }

    #[test]
    fn huge_page_ceiling_opens_and_accepts_rows() {
        let file = NamedTempFile::new().unwrap();
        let mut table = Table::open(file.path(), &small_config(usize::MAX)).unwrap();
        table.insert(&user(1)).unwrap();
        assert!(!table.is_full());
        assert_eq!(table.max_rows(), Some(usize::MAX));
    }

    #[test]
    fn unbounded_table_grows_past_default_capacity() {
        let file = NamedTempFile::new().unwrap();
        let config = Config::builder().unbounded().build();
        let mut table = Table::open(file.path(), &config).unwrap();
        for id in 0..(3 * ROWS_PER_PAGE as u32) {
            table.insert(&user(id)).unwrap();
        }
        assert!(!table.is_full());
        assert_eq!(table.max_rows(), None);
    }

    #[test]
    fn row_slot_rejects_unwritten_rows() {
        let file = NamedTempFile::new().unwrap();
        let mut table = Table::open_default(file.path()).unwrap();
        table.insert(&user(1)).unwrap();
        assert!(matches!(
            table.row_slot(1),
            Err(DbError::RowOutOfBounds {
                row: 1,
                row_count: 1
            })
        ));
    }

    #[test]
    fn rows_land_on_expected_pages() {
        let file = NamedTempFile::new().unwrap();
        let mut table = Table::open_default(file.path()).unwrap();
        for id in 0..=ROWS_PER_PAGE as u32 {
            table.insert(&user(id)).unwrap();
        }
        assert_eq!(table.pager().resident_pages(), 2);
        assert_eq!(Row::deserialize(table.row_slot(ROWS_PER_PAGE).unwrap()).id(), 13);
    }

    #[test]
    fn close_writes_exactly_the_stored_rows() {
        let file = NamedTempFile::new().unwrap();
        let mut table = Table::open_default(file.path()).unwrap();
        for id in 0..14 {
            table.insert(&user(id)).unwrap();
        }
        table.close().unwrap();

        let len = fs::metadata(file.path()).unwrap().len() as usize;
        assert_eq!(len, 14 * ROW_SIZE);
        assert_eq!(len - PAGE_DATA_SIZE, ROW_SIZE);
    }

    #[test]
    fn dropping_without_close_still_flushes() {
        let file = NamedTempFile::new().unwrap();
        {
            let mut table = Table::open_default(file.path()).unwrap();
            table.insert(&user(5)).unwrap();
        }
        let mut table = Table::open_default(file.path()).unwrap();
        let rows: Vec<Row> = table.select().collect::<Result<_>>().unwrap();
        assert_eq!(rows, vec![user(5)]);
    }

    #[test]
    fn malformed_length_is_rejected_by_default() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), vec![0u8; ROW_SIZE + 7]).unwrap();
        let err = Table::open_default(file.path()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corruption);
    }

    #[test]
    fn malformed_length_can_be_truncated() {
        let file = NamedTempFile::new().unwrap();
        let mut bytes = vec![0u8; ROW_SIZE];
        user(8).serialize(&mut bytes);
        bytes.extend_from_slice(&[0xab; 7]);
        fs::write(file.path(), &bytes).unwrap();

        let config = Config::builder()
            .trailing_bytes(TrailingBytes::Truncate)
            .build();
        let mut table = Table::open(file.path(), &config).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.select().next().unwrap().unwrap(), user(8));
        table.close().unwrap();

        assert_eq!(fs::metadata(file.path()).unwrap().len(), ROW_SIZE as u64);
    }

    #[test]
    fn file_larger_than_ceiling_is_refused() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), vec![0u8; (ROWS_PER_PAGE + 1) * ROW_SIZE]).unwrap();
        let err = Table::open(file.path(), &small_config(1)).err().unwrap();
        assert!(matches!(err, DbError::PageOutOfBounds { page: 1, .. }));
    }
}
