//! Open-time options for a table.

use crate::{ROWS_PER_PAGE, TABLE_MAX_PAGES};

#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on resident pages. `None` lets the page array grow without limit.
    pub max_pages: Option<usize>,

    /// What to do with a file whose length is not a whole number of rows.
    pub trailing_bytes: TrailingBytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingBytes {
    /// Refuse to open the file.
    #[default]
    Reject,
    /// Cut the file back to the last whole row.
    Truncate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_pages: Some(TABLE_MAX_PAGES),
            trailing_bytes: TrailingBytes::Reject,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Row capacity implied by the page ceiling, saturating for very large ceilings.
    pub fn max_rows(&self) -> Option<usize> {
        self.max_pages.map(|pages| pages.saturating_mul(ROWS_PER_PAGE))
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.config.max_pages = Some(pages);
        self
    }

    /// Remove the page ceiling entirely.
    pub fn unbounded(mut self) -> Self {
        self.config.max_pages = None;
        self
    }

    pub fn trailing_bytes(mut self, policy: TrailingBytes) -> Self {
        self.config.trailing_bytes = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TABLE_MAX_ROWS;

    #[test]
    fn default_matches_reference_sizing() {
        let config = Config::default();
        assert_eq!(config.max_pages, Some(TABLE_MAX_PAGES));
        assert_eq!(config.max_rows(), Some(TABLE_MAX_ROWS));
        assert_eq!(config.trailing_bytes, TrailingBytes::Reject);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::builder()
            .max_pages(2)
            .trailing_bytes(TrailingBytes::Truncate)
            .build();
        assert_eq!(config.max_rows(), Some(2 * ROWS_PER_PAGE));
        assert_eq!(config.trailing_bytes, TrailingBytes::Truncate);

        assert_eq!(Config::builder().unbounded().build().max_rows(), None);
    }

    #[test]
    fn huge_ceiling_saturates() {
        let config = Config::builder().max_pages(usize::MAX).build();
        assert_eq!(config.max_rows(), Some(usize::MAX));
    }
}
