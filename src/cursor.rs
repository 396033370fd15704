use crate::{DbError, Result, Table};

/// A position in a table, used to scan rows or to find where the next row goes.
///
/// The cursor borrows the table mutably, so the table cannot change under a live cursor.
pub struct Cursor<'a> {
    table: &'a mut Table,
    row_num: usize,
    // one past the last row, where the next insert lands
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    pub fn start(table: &'a mut Table) -> Self {
        let end_of_table = table.row_count() == 0;
        Self {
            table,
            row_num: 0,
            end_of_table,
        }
    }

    pub fn end(table: &'a mut Table) -> Self {
        let row_num = table.row_count();
        Self {
            table,
            row_num,
            end_of_table: true,
        }
    }

    pub fn row_num(&self) -> usize {
        self.row_num
    }

    pub fn end_of_table(&self) -> bool {
        self.end_of_table
    }

    /// Bytes of the row under the cursor.
    pub fn value(&mut self) -> Result<&[u8]> {
        self.table.row_slot(self.row_num)
    }

    /// Writable bytes of the append slot. Only valid at the end of the table.
    pub fn value_mut(&mut self) -> Result<&mut [u8]> {
        let row_count = self.table.row_count();
        if self.row_num != row_count {
            return Err(DbError::RowOutOfBounds {
                row: self.row_num,
                row_count,
            });
        }
        self.table.append_slot()
    }

    pub fn advance(&mut self) {
        self.row_num += 1;
        if self.row_num >= self.table.row_count() {
            self.end_of_table = true;
        }
    }
}
