//! Offset pagination.
//!
//! A [`PageRequest`] selects a zero-based page of a fixed size; a [`Page`]
//! carries the items of that slice plus the totals needed to render pagers.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`PageRequest`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageRequestError {
    /// The page size is outside `1..=PageRequest::MAX_SIZE`.
    #[error("page size must be between 1 and {max} (got {got})")]
    InvalidSize {
        /// Requested size.
        got: u32,
        /// Maximum allowed size.
        max: u32,
    },
}

/// A request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Page size used when the client does not specify one.
    pub const DEFAULT_SIZE: u32 = 10;
    /// Largest page a client may request.
    pub const MAX_SIZE: u32 = 1000;

    /// Create a page request.
    ///
    /// # Errors
    ///
    /// Returns `PageRequestError::InvalidSize` if `size` is zero or above
    /// [`Self::MAX_SIZE`].
    pub const fn new(page: u32, size: u32) -> Result<Self, PageRequestError> {
        if size == 0 || size > Self::MAX_SIZE {
            return Err(PageRequestError::InvalidSize {
                got: size,
                max: Self::MAX_SIZE,
            });
        }
        Ok(Self { page, size })
    }

    /// Zero-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of items to skip (`page * size`).
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Number of items across all pages.
    pub total_elements: u64,
    /// Number of pages at the requested size.
    pub total_pages: u64,
    /// Zero-based page number.
    pub page: u32,
    /// Requested page size.
    pub size: u32,
}

impl<T> Page<T> {
    /// Assemble a page from its items and the total item count.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            items,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(request.size())),
            page: request.page(),
            size: request.size(),
        }
    }
}
