use std::fmt;

use crate::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, DbError, EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE,
    ROW_SIZE, Result, USERNAME_OFFSET, USERNAME_SIZE,
};

/// One record of the single table: `(id, username, email)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: u32,
    username: String,
    email: String,
}

impl Row {
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let email = email.into();
        check_len("username", &username, COLUMN_USERNAME_SIZE)?;
        check_len("email", &email, COLUMN_EMAIL_SIZE)?;
        Ok(Self {
            id,
            username,
            email,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Writes the row into a `ROW_SIZE` slot. The id is stored in native byte order and each text
    /// column fills its whole width, zero padded.
    pub fn serialize(&self, dest: &mut [u8]) {
        let dest = &mut dest[..ROW_SIZE];
        dest[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_ne_bytes());
        write_text(
            &mut dest[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE],
            &self.username,
        );
        write_text(
            &mut dest[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE],
            &self.email,
        );
    }

    /// Reads a row back from a `ROW_SIZE` slot. Text columns end at their first zero byte.
    pub fn deserialize(src: &[u8]) -> Self {
        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&src[ID_OFFSET..ID_OFFSET + ID_SIZE]);
        Self {
            id: u32::from_ne_bytes(id),
            username: read_text(&src[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]),
            email: read_text(&src[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(DbError::StringTooLong {
            field,
            max,
            actual: value.len(),
        });
    }
    Ok(())
}

fn write_text(dest: &mut [u8], text: &str) {
    // always leave room for the terminator
    let len = text.len().min(dest.len() - 1);
    dest[..len].copy_from_slice(&text.as_bytes()[..len]);
    dest[len..].fill(0);
}

fn read_text(src: &[u8]) -> String {
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}
