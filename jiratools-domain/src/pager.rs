use tracing::debug;

use crate::{
    error::SourceError,
    model::{Issue, SearchPage},
    source::IssueSource,
};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Drives `IssueSource::search` until a query's full result set is retrieved.
pub struct SearchPager<'a, S: ?Sized> {
    source: &'a S,
    page_size: usize,
}

impl<'a, S: IssueSource + ?Sized> SearchPager<'a, S> {
    pub fn new(source: &'a S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
        }
    }

    pub fn fetch_all(&self, jql: &str) -> Result<Vec<Issue>, SourceError> {
        let issues = collect_pages(self.page_size, |start_at, page_size| {
            self.source.search(jql, start_at, page_size)
        })?;
        debug!(jql, count = issues.len(), "search complete");
        Ok(issues)
    }
}

/// Page loop shared by every endpoint that answers with a search envelope.
///
/// Stops once `total < start_at + max_results` for the page just merged; the
/// first response's `total` is trusted for the rest of the run.
pub fn collect_pages<F>(page_size: usize, mut fetch: F) -> Result<Vec<Issue>, SourceError>
where
    F: FnMut(usize, usize) -> Result<SearchPage, SourceError>,
{
    let page_size = page_size.max(1);
    let mut issues = Vec::new();
    let mut start_at = 0usize;

    loop {
        let page = fetch(start_at, page_size)?;
        let returned_max = if page.max_results == 0 {
            page_size
        } else {
            page.max_results
        };
        debug!(
            start_at,
            reported_start = page.start_at,
            returned = page.issues.len(),
            total = page.total,
            "merged search page"
        );
        issues.extend(page.issues);

        if page.total < start_at + returned_max {
            break;
        }
        start_at += page_size;
    }

    Ok(issues)
}
