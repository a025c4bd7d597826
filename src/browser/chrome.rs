use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tracing::{debug, warn};

use super::Session;
use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};

fn transport(e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Transport(e.to_string())
}

/// Headless Chrome through chromiumoxide, driving one page.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handle: tokio::task::JoinHandle<()>,
    load_wait: Duration,
}

impl ChromeSession {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .window_size(1920, 1080);
        if let Some(path) = &settings.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(transport)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(transport)?;

        // The handler drives the CDP connection and must keep polling; a
        // failed event does not end the session.
        let handle = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser.new_page("about:blank").await.map_err(transport)?;

        Ok(Self {
            browser,
            page,
            handle,
            load_wait: Duration::from_millis(settings.load_wait_ms),
        })
    }

    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {}", e);
        }
        self.handle.abort();
        Ok(())
    }
}

#[async_trait]
impl Session for ChromeSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("navigate {}", url);
        self.page.goto(url).await.map_err(transport)?;
        self.page.wait_for_navigation().await.map_err(transport)?;
        // Stats tables render after the document load event.
        tokio::time::sleep(self.load_wait).await;
        Ok(())
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>> {
        self.page.find_elements(selector).await.map_err(transport)
    }

    async fn find_all_in(&mut self, parent: &Element, selector: &str) -> Result<Vec<Element>> {
        parent.find_elements(selector).await.map_err(transport)
    }

    async fn text(&mut self, element: &Element) -> Result<String> {
        Ok(element
            .inner_text()
            .await
            .map_err(transport)?
            .unwrap_or_default())
    }

    async fn attribute(&mut self, element: &Element, name: &str) -> Result<Option<String>> {
        element.attribute(name).await.map_err(transport)
    }

    async fn click(&mut self, element: &Element) -> Result<()> {
        element.click().await.map_err(transport)?;
        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
