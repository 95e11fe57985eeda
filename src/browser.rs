// Headless Chromium session backing the scrape variant.
//
// chromiumoxide is async; each session owns a private current-thread tokio
// runtime and blocks on it for every call, so callers stay synchronous.

use crate::error::ScrapeError;
use crate::scrape::{BrowserSession, SessionLauncher};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

/// Launch options for Chromium.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    /// Show the browser window.
    pub headed: bool,
    /// Browser executable; auto-detected when `None`.
    pub executable: Option<PathBuf>,
}

impl ChromeLauncher {
    fn config(&self) -> Result<BrowserConfig, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox") // Required for containerized environments
            .arg("--disable-dev-shm-usage");
        if self.headed {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(ScrapeError::Config)
    }
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> Result<ChromeSession, ScrapeError> {
        let config = self.config()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        tracing::info!(headed = self.headed, "Launching browser");
        let (mut browser, mut handler) = runtime.block_on(Browser::launch(config))?;
        let handle = runtime.spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match runtime.block_on(browser.new_page("about:blank")) {
            Ok(page) => page,
            Err(e) => {
                // Don't leak the child process if the first tab fails.
                let _ = runtime.block_on(browser.close());
                let _ = runtime.block_on(handle);
                return Err(e.into());
            }
        };

        Ok(ChromeSession {
            runtime,
            browser,
            page,
            handler: Some(handle),
        })
    }
}

/// One Chromium process with a single tab. Closed on drop if not closed
/// explicitly.
pub struct ChromeSession {
    runtime: Runtime,
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.runtime.block_on(self.page.goto(url))?;
        Ok(())
    }

    fn content(&mut self) -> Result<String, ScrapeError> {
        Ok(self.runtime.block_on(self.page.content())?)
    }

    fn close(&mut self) -> Result<(), ScrapeError> {
        let Some(handler) = self.handler.take() else {
            return Ok(());
        };
        let closed = self.runtime.block_on(self.browser.close());
        finish_teardown(&self.runtime, closed, handler)?;
        tracing::debug!("Browser closed");
        Ok(())
    }
}

/// Join the CDP handler task after a close attempt. A failed close can leave
/// the connection open and the handler running forever, so it is aborted
/// first in that case.
fn finish_teardown<T, E>(
    runtime: &Runtime,
    closed: Result<T, E>,
    handler: JoinHandle<()>,
) -> Result<(), ScrapeError>
where
    ScrapeError: From<E>,
{
    if closed.is_err() {
        handler.abort();
    }
    let joined = runtime.block_on(handler);
    closed?;
    joined?;
    Ok(())
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Failed to close browser on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn failed_close_does_not_wait_on_live_handler() {
        let rt = runtime();
        let handler = rt.spawn(std::future::pending::<()>());
        let closed: Result<(), std::io::Error> = Err(std::io::Error::other("close failed"));
        let err = finish_teardown(&rt, closed, handler).unwrap_err();
        assert!(matches!(err, ScrapeError::Runtime(_)));
    }

    #[test]
    fn successful_close_joins_finished_handler() {
        let rt = runtime();
        let handler = rt.spawn(async {});
        let closed: Result<(), std::io::Error> = Ok(());
        assert!(finish_teardown(&rt, closed, handler).is_ok());
    }
}
