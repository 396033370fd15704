pub mod config;
pub mod cursor;
pub mod error;
pub mod pager;
pub mod row;
pub mod statement;
pub mod table;

pub use config::{Config, TrailingBytes};
pub use cursor::Cursor;
pub use error::{DbError, ErrorKind, Result};
pub use pager::Pager;
pub use row::Row;
pub use statement::{MetaCommand, PrepareError, Statement};
pub use table::{Rows, Table};

pub const COLUMN_USERNAME_SIZE: usize = 32;
pub const COLUMN_EMAIL_SIZE: usize = 255;
pub const ID_SIZE: usize = size_of::<u32>();
// +1 for the terminator byte
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

pub const PAGE_SIZE: usize = 4096;
pub const TABLE_MAX_PAGES: usize = 100;
pub const ROWS_PER_PAGE: usize = PAGE_SIZE / ROW_SIZE;
// Bytes of a page that hold rows. Pages are packed back to back on disk with this stride; the
// remainder of each in-memory page is never written.
pub const PAGE_DATA_SIZE: usize = ROWS_PER_PAGE * ROW_SIZE;
pub const TABLE_MAX_ROWS: usize = ROWS_PER_PAGE * TABLE_MAX_PAGES;
