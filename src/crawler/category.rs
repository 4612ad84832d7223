//! Category listing traversal
//!
//! Lists every candidate title of one task by walking the category's
//! paginated listing from the first page.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{parse_category_page, CandidateEntity};
use crate::planner::Task;
use crate::CrawlError;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// A candidate title together with the listing page it was found on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntity {
    pub entity: CandidateEntity,
    pub listing_url: String,
}

/// Fetches the full listing of a task
#[derive(Debug, Clone)]
pub struct CategoryFetcher {
    fetcher: PageFetcher,
}

impl CategoryFetcher {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Lists all candidates of a task, following "next page" links
    ///
    /// Traversal stops when there is no next link, when a page lists nothing,
    /// or when a next link points back at a page already visited. Titles are
    /// de-duplicated by detail URL, first occurrence wins.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ListedEntity>)` - Candidates in listing order
    /// * `Err(CrawlError::Fetch | CrawlError::Parse)` - A page failed; nothing
    ///   from earlier pages is returned
    /// * `Err(CrawlError::Cancelled)` - Cancellation was requested between pages
    pub async fn fetch_listing(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<Vec<ListedEntity>, CrawlError> {
        let mut next = Some(task.source_url.clone());
        let mut visited = HashSet::new();
        let mut seen_details = HashSet::new();
        let mut listed = Vec::new();
        let mut page_number = 1;

        while let Some(page_url) = next.take() {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }

            if !visited.insert(page_url.clone()) {
                tracing::warn!(
                    "{}: next link loops back to {}, stopping pagination",
                    task.id(),
                    page_url
                );
                break;
            }

            tracing::debug!("{}: fetching listing page {} ({})", task.id(), page_number, page_url);
            let body = self.fetcher.fetch_with_retry(&page_url).await?;
            let page = parse_category_page(&body, &page_url)?;

            if page.entities.is_empty() {
                tracing::debug!("{}: page {} lists no titles", task.id(), page_number);
                break;
            }

            let found = page.entities.len();
            for entity in page.entities {
                if seen_details.insert(entity.detail_url.clone()) {
                    listed.push(ListedEntity {
                        entity,
                        listing_url: page_url.clone(),
                    });
                }
            }
            tracing::debug!("{}: page {} lists {} titles", task.id(), page_number, found);

            next = page.next_page;
            page_number += 1;
        }

        Ok(listed)
    }
}
