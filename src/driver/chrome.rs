//! Headless Chromium driver over the DevTools protocol.
//!
//! Launches a browser with `chromiumoxide`, keeps its CDP event loop running
//! in a spawned task, and exposes one page through [`PageDriver`].
//!
//! Clicks are hit-tested first: the element is scrolled into view and
//! `document.elementFromPoint` is consulted at its centre. If something else
//! (a consent banner, a promo overlay) would receive the click, the driver
//! reports [`DriverError::NotInteractable`] instead of clicking through it.

use super::PageDriver;
use crate::error::DriverError;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

const HIT_TEST_JS: &str = r#"function() {
    this.scrollIntoView({ block: 'center', inline: 'center' });
    const r = this.getBoundingClientRect();
    if (r.width === 0 || r.height === 0) { return 'hidden'; }
    const top = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
    if (top === null) { return 'hidden'; }
    return (top === this || this.contains(top)) ? 'ok' : 'covered';
}"#;

/// A Chromium instance with a single working page.
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl std::fmt::Debug for ChromeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeDriver").finish_non_exhaustive()
    }
}

impl ChromeDriver {
    /// Launch Chromium and open a blank page.
    #[instrument(level = "info")]
    pub async fn launch(headless: bool) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .args(vec![
                "--disable-extensions",
                "--disable-gpu",
                "--disable-dev-shm-usage",
            ]);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(DriverError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
            debug!("CDP handler loop exited");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Browser(e.to_string()))?;

        info!(headless, "Chromium launched");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Run a function declaration with `this` bound to `item`, decoding the
    /// returned JSON value.
    async fn call_on(
        &self,
        item: &Element,
        function: String,
    ) -> Result<Option<serde_json::Value>, DriverError> {
        let returns = item
            .call_js_fn(function, false)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(returns.result.value)
    }
}

fn browser_err(e: impl std::fmt::Display) -> DriverError {
    DriverError::Browser(e.to_string())
}

impl PageDriver for ChromeDriver {
    type Item = Element;

    #[instrument(level = "info", skip(self))]
    async fn open_url(&self, url: &str) -> Result<(), DriverError> {
        self.page.goto(url).await.map_err(browser_err)?;
        info!("Site opened");
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, DriverError> {
        self.page.find_elements(selector).await.map_err(browser_err)
    }

    async fn find_in(&self, scope: &Element, selector: &str) -> Result<Option<Element>, DriverError> {
        let found = scope.find_elements(selector).await.map_err(browser_err)?;
        Ok(found.into_iter().next())
    }

    async fn read_attribute(&self, item: &Element, name: &str) -> Result<Option<String>, DriverError> {
        let name = serde_json::to_string(name).map_err(|e| DriverError::Script(e.to_string()))?;
        let function = format!(
            r#"function() {{
                const p = this[{name}];
                if (typeof p === 'string' || typeof p === 'number' || typeof p === 'boolean') {{
                    return String(p);
                }}
                return this.getAttribute({name});
            }}"#
        );
        match self.call_on(item, function).await? {
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    async fn read_text(&self, item: &Element) -> Result<String, DriverError> {
        Ok(item
            .inner_text()
            .await
            .map_err(browser_err)?
            .unwrap_or_default())
    }

    async fn click(&self, item: &Element) -> Result<(), DriverError> {
        let verdict = self.call_on(item, HIT_TEST_JS.to_string()).await?;
        match verdict.as_ref().and_then(|v| v.as_str()) {
            Some("ok") => {}
            Some(other) => {
                return Err(DriverError::NotInteractable(format!(
                    "hit test reported `{other}`"
                )));
            }
            None => warn!("Hit test returned no verdict; clicking anyway"),
        }
        item.click().await.map_err(browser_err)?;
        Ok(())
    }

    async fn select_option(&self, item: &Element, visible_text: &str) -> Result<(), DriverError> {
        let wanted =
            serde_json::to_string(visible_text).map_err(|e| DriverError::Script(e.to_string()))?;
        let function = format!(
            r#"function() {{
                const wanted = {wanted};
                const option = Array.from(this.options || []).find(o => o.text.trim() === wanted);
                if (!option) {{ return false; }}
                this.value = option.value;
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }}"#
        );
        match self.call_on(item, function).await? {
            Some(serde_json::Value::Bool(true)) => Ok(()),
            _ => Err(DriverError::NotFound(format!("option `{visible_text}`"))),
        }
    }

    async fn refresh(&self) -> Result<(), DriverError> {
        self.page.reload().await.map_err(browser_err)?;
        info!("Page refreshed");
        Ok(())
    }

    async fn current_ready_state(&self) -> Result<String, DriverError> {
        self.page
            .evaluate("document.readyState")
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    #[instrument(level = "info", skip_all)]
    async fn shutdown(mut self) -> Result<(), DriverError> {
        let closed = self.browser.close().await.map_err(browser_err);
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Waiting for Chromium to exit failed");
        }
        self.handler.abort();
        closed?;
        info!("WebDriver quit successfully");
        Ok(())
    }
}
