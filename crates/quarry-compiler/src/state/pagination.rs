//! Pagination in either of two families: `limit/offset` or `page/per_page`.

/// Both families are recorded as given; [`Pagination::resolve`] decides
/// which one reaches the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Wire-level `page`/`per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Pagination {
    pub fn is_empty(&self) -> bool {
        *self == Pagination::default()
    }

    /// Explicit page/per wins outright. Otherwise `limit` derives
    /// `page = offset / limit + 1` and `per_page = limit`. An offset without a
    /// limit cannot be expressed and is dropped.
    pub fn resolve(&self) -> Option<PageWindow> {
        if self.page.is_some() || self.per_page.is_some() {
            return Some(PageWindow {
                page: Some(self.page.unwrap_or(1)),
                per_page: self.per_page,
            });
        }
        let limit = self.limit?;
        let offset = self.offset.unwrap_or(0);
        Some(PageWindow {
            page: Some(offset / limit + 1),
            per_page: Some(limit),
        })
    }

    /// Whether an explicit page or per-page was requested.
    pub fn is_explicit(&self) -> bool {
        self.page.is_some() || self.per_page.is_some()
    }
}
