// Browser-scrape variant: lists followers/following by rendering the
// profile tabs page by page instead of calling the REST API. The browser
// itself sits behind `BrowserSession` so the pagination rules can run
// against any renderer.

use crate::api::{RelationshipKind, RelationshipSet};
use crate::error::ScrapeError;
use crate::follows::RelationshipSource;
use scraper::{Html, Selector};
use std::thread;
use std::time::Duration;

pub const DEFAULT_WEB_BASE_URL: &str = "https://github.com";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Handle text on the followers/following tabs.
pub const IDENTIFIER_SELECTOR: &str = "span[class='Link--secondary']";
/// Pagination control leading to the next page of the tab.
pub const NEXT_PAGE_SELECTOR: &str = "a[class*='next_page']";

/// A live, exclusively owned browser tab.
pub trait BrowserSession {
    /// Load `url` and wait for navigation to finish.
    fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Current rendered DOM as HTML.
    fn content(&mut self) -> Result<String, ScrapeError>;

    /// Tear the session down. Must be safe to call more than once.
    fn close(&mut self) -> Result<(), ScrapeError>;
}

/// Opens browser sessions.
pub trait SessionLauncher {
    type Session: BrowserSession;

    fn launch(&self) -> Result<Self::Session, ScrapeError>;
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub base_url: String,
    /// Fixed wait between loading a page and reading its DOM.
    pub settle_delay: Duration,
    pub identifier_selector: String,
    pub next_selector: String,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        ScrapeSettings {
            base_url: DEFAULT_WEB_BASE_URL.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            identifier_selector: IDENTIFIER_SELECTOR.to_string(),
            next_selector: NEXT_PAGE_SELECTOR.to_string(),
        }
    }
}

pub fn listing_url(base_url: &str, account: &str, page: u32, kind: RelationshipKind) -> String {
    format!("{}/{}?page={}&tab={}", base_url.trim_end_matches('/'), account, page, kind)
}

struct ListingSelectors {
    identifier: Selector,
    next: Selector,
}

impl ListingSelectors {
    fn new(settings: &ScrapeSettings) -> Result<Self, ScrapeError> {
        Ok(ListingSelectors {
            identifier: compile(&settings.identifier_selector)?,
            next: compile(&settings.next_selector)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// What one rendered listing page yielded.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Number of identifier nodes matched, including ones with blank text.
    pub node_count: usize,
    pub identifiers: Vec<String>,
    pub has_next: bool,
}

impl ListingPage {
    fn parse(html: &str, selectors: &ListingSelectors) -> Self {
        let document = Html::parse_document(html);
        let mut page = ListingPage::default();
        for node in document.select(&selectors.identifier) {
            page.node_count += 1;
            let text = node.text().collect::<String>();
            let handle = text.trim();
            if !handle.is_empty() {
                page.identifiers.push(handle.to_string());
            }
        }
        page.has_next = document.select(&selectors.next).next().is_some();
        page
    }

    /// Pagination ends on a page with no identifier nodes, or on a page
    /// without a next control, whichever comes first.
    pub fn is_last(&self) -> bool {
        self.node_count == 0 || !self.has_next
    }
}

/// Walks the followers/following tabs of a profile through a borrowed
/// session.
pub struct Scraper<'a, S: BrowserSession> {
    session: &'a mut S,
    settings: &'a ScrapeSettings,
    selectors: ListingSelectors,
}

impl<'a, S: BrowserSession> Scraper<'a, S> {
    pub fn new(session: &'a mut S, settings: &'a ScrapeSettings) -> Result<Self, ScrapeError> {
        let selectors = ListingSelectors::new(settings)?;
        Ok(Scraper { session, settings, selectors })
    }

    fn load_page(&mut self, url: &str) -> Result<ListingPage, ScrapeError> {
        self.session.navigate(url)?;
        thread::sleep(self.settings.settle_delay);
        let html = self.session.content()?;
        Ok(ListingPage::parse(&html, &self.selectors))
    }

    pub fn scrape_relationship_set(
        &mut self,
        account: &str,
        kind: RelationshipKind,
    ) -> Result<RelationshipSet, ScrapeError> {
        let mut set = RelationshipSet::new();
        let mut page_num = 1;
        loop {
            let url = listing_url(&self.settings.base_url, account, page_num, kind);
            let page = self.load_page(&url)?;
            tracing::debug!(
                url = %url,
                nodes = page.node_count,
                has_next = page.has_next,
                "Scraped page"
            );
            let last = page.is_last();
            set.extend(page.identifiers);
            if last {
                break;
            }
            page_num += 1;
        }
        tracing::info!(
            account,
            %kind,
            count = set.len(),
            pages = page_num,
            "Scraped relationship set"
        );
        Ok(set)
    }
}

impl<S: BrowserSession> RelationshipSource for Scraper<'_, S> {
    type Error = ScrapeError;

    fn relationship_set(
        &mut self,
        account: &str,
        kind: RelationshipKind,
    ) -> Result<RelationshipSet, ScrapeError> {
        self.scrape_relationship_set(account, kind)
    }
}

/// Closes the session when dropped unless it was already released, so an
/// unwinding scrape still tears the browser down.
struct SessionGuard<S: BrowserSession> {
    session: S,
    released: bool,
}

impl<S: BrowserSession> SessionGuard<S> {
    fn release(mut self) -> Result<(), ScrapeError> {
        self.released = true;
        self.session.close()
    }
}

impl<S: BrowserSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.session.close() {
                tracing::warn!(error = %e, "Failed to close browser session");
            }
        }
    }
}

/// Launch a session, run `f` with it, and close it on every exit path.
/// A failure to close is logged; it does not replace the result of `f`.
pub fn with_session<L, T, F>(launcher: &L, f: F) -> Result<T, ScrapeError>
where
    L: SessionLauncher,
    F: FnOnce(&mut L::Session) -> Result<T, ScrapeError>,
{
    let mut guard = SessionGuard {
        session: launcher.launch()?,
        released: false,
    };
    let result = f(&mut guard.session);
    if let Err(e) = guard.release() {
        tracing::warn!(error = %e, "Failed to close browser session");
    }
    result
}
