//! [`Navigator`] backed by a real Chrome through the DevTools Protocol.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use super::{site, Extract, Field, HarvestError, Navigator, TabHandle};
use crate::config::BrowserSettings;
use crate::credentials::SessionCredential;

/// A headless Chrome session authenticated with injected cookies.
pub struct ChromiumNavigator {
    browser: Browser,
    handler_task: JoinHandle<()>,
    primary: Page,
    primary_tab: TabHandle,
    auxiliary: Option<(TabHandle, Page)>,
    active: TabHandle,
    /// Throwaway Chrome profile, removed when the session ends.
    profile_dir: TempDir,
}

/// Attempts to see Chrome's startup tab after `fetch_targets`.
const STARTUP_PAGE_POLLS: u32 = 20;
const STARTUP_PAGE_POLL_INTERVAL: Duration = Duration::from_millis(50);

impl ChromiumNavigator {
    /// Launch the browser, load a same-domain placeholder page and inject
    /// `credentials` as cookies.
    pub async fn launch(
        settings: &BrowserSettings,
        credentials: &[SessionCredential],
    ) -> Result<Self> {
        let profile_dir = new_profile_dir()?;
        let (mut browser, mut handler) = launch_browser(settings, profile_dir.path()).await?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        // Cookies can only be set once a document from the site is loaded.
        let primary = match adopt_startup_page(&mut browser).await? {
            Some(page) => {
                page.goto(site::placeholder_url())
                    .await
                    .context("Failed to open placeholder page")?;
                page
            }
            None => browser
                .new_page(site::placeholder_url())
                .await
                .context("Failed to open placeholder page")?,
        };
        apply_cookies(&primary, credentials).await?;
        tracing::info!(cookies = credentials.len(), "Injected session cookies");

        let primary_tab = tab_handle(&primary);
        Ok(Self {
            browser,
            handler_task,
            primary,
            active: primary_tab.clone(),
            primary_tab,
            auxiliary: None,
            profile_dir,
        })
    }

    /// Close the browser. Consumes the session so it can only happen once.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some((_, page)) = self.auxiliary.take() {
            page.close().await.ok();
        }
        self.browser
            .close()
            .await
            .context("Failed to close browser")?;
        self.browser.wait().await.ok();
        self.handler_task.abort();
        self.profile_dir
            .close()
            .context("Failed to remove browser profile")?;
        Ok(())
    }

    fn active_page(&self) -> Result<&Page> {
        if self.active == self.primary_tab {
            return Ok(&self.primary);
        }
        match &self.auxiliary {
            Some((handle, page)) if *handle == self.active => Ok(page),
            _ => Err(HarvestError::UnknownTab(self.active.to_string()).into()),
        }
    }
}

#[async_trait::async_trait]
impl Navigator for ChromiumNavigator {
    fn primary_tab(&self) -> &TabHandle {
        &self.primary_tab
    }

    fn active_tab(&self) -> &TabHandle {
        &self.active
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        tracing::debug!(url, tab = %self.active, "Navigating");
        self.active_page()?
            .goto(url)
            .await
            .with_context(|| format!("Navigation to {url} failed"))?;
        Ok(())
    }

    async fn open_tab(&mut self) -> Result<TabHandle> {
        if self.auxiliary.is_some() {
            return Err(HarvestError::AuxiliaryTabOpen.into());
        }
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open tab")?;
        page.activate().await.context("Failed to focus new tab")?;

        let handle = tab_handle(&page);
        self.auxiliary = Some((handle.clone(), page));
        self.active = handle.clone();
        Ok(handle)
    }

    async fn close_tab(&mut self, tab: &TabHandle) -> Result<()> {
        if *tab == self.primary_tab {
            return Err(HarvestError::PrimaryTabClose.into());
        }
        match self.auxiliary.take() {
            Some((handle, page)) if handle == *tab => {
                page.close().await.context("Failed to close tab")?;
                Ok(())
            }
            other => {
                self.auxiliary = other;
                Err(HarvestError::UnknownTab(tab.to_string()).into())
            }
        }
    }

    async fn switch_to(&mut self, tab: &TabHandle) -> Result<()> {
        let page = if *tab == self.primary_tab {
            &self.primary
        } else {
            match &self.auxiliary {
                Some((handle, page)) if handle == tab => page,
                _ => return Err(HarvestError::UnknownTab(tab.to_string()).into()),
            }
        };
        page.activate().await.context("Failed to focus tab")?;
        self.active = tab.clone();
        Ok(())
    }

    async fn read(&mut self, field: &Field) -> Result<String> {
        let element = self
            .active_page()?
            .find_element(field.selector)
            .await
            .map_err(|err| not_found(field.selector, err))?;
        read_element(&element, field).await
    }

    async fn read_entries(
        &mut self,
        container: &str,
        entry: &str,
        fields: &[Field],
    ) -> Result<Vec<Vec<String>>> {
        let container_el = self
            .active_page()?
            .find_element(container)
            .await
            .map_err(|err| not_found(container, err))?;
        let entries = container_el
            .find_elements(entry)
            .await
            .with_context(|| format!("Failed to query {entry}"))?;

        let mut rows = Vec::with_capacity(entries.len());
        for entry_el in &entries {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                let element = entry_el
                    .find_element(field.selector)
                    .await
                    .map_err(|err| not_found(field.selector, err))?;
                values.push(read_element(&element, field).await?);
            }
            rows.push(values);
        }
        Ok(rows)
    }
}

fn tab_handle(page: &Page) -> TabHandle {
    TabHandle::new(page.target_id().inner().clone())
}

/// Turn a failed selector lookup into [`HarvestError::ElementNotFound`].
///
/// A selector without a match surfaces as a protocol error response (the
/// lookup resolves to node 0, which Chrome then refuses to describe) or as
/// [`CdpError::NotFound`]. Anything else is a transport failure and is kept
/// as is.
fn not_found(selector: &str, err: CdpError) -> anyhow::Error {
    match err {
        CdpError::Chrome(_) | CdpError::NotFound => {
            tracing::debug!(selector, error = %err, "Selector lookup failed");
            HarvestError::ElementNotFound {
                selector: selector.to_string(),
            }
            .into()
        }
        other => anyhow::Error::new(other).context(format!("Failed to query {selector}")),
    }
}

async fn read_element(element: &Element, field: &Field) -> Result<String> {
    match field.extract {
        Extract::Text => Ok(element
            .inner_text()
            .await
            .with_context(|| format!("Failed to read {}", field.name))?
            .unwrap_or_default()),
        Extract::Attribute(attribute) => element
            .attribute(attribute)
            .await
            .with_context(|| format!("Failed to read {}", field.name))?
            .ok_or_else(|| {
                HarvestError::MissingAttribute {
                    selector: field.selector.to_string(),
                    attribute: attribute.to_string(),
                }
                .into()
            }),
    }
}

fn new_profile_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("purchase-harvester-profile-")
        .tempdir()
        .context("Failed to create browser profile directory")
}

/// Reuse the tab Chrome opens at startup as the primary tab.
///
/// Any further startup tabs are closed so the session holds exactly one tab
/// until an auxiliary one is opened.
async fn adopt_startup_page(browser: &mut Browser) -> Result<Option<Page>> {
    let targets = browser
        .fetch_targets()
        .await
        .context("Failed to list browser targets")?;
    let expected = targets.iter().filter(|t| t.r#type == "page").count();

    // Attached pages show up shortly after the targets are fetched.
    let mut pages = browser.pages().await.context("Failed to list tabs")?;
    for _ in 0..STARTUP_PAGE_POLLS {
        if pages.len() >= expected {
            break;
        }
        tokio::time::sleep(STARTUP_PAGE_POLL_INTERVAL).await;
        pages = browser.pages().await.context("Failed to list tabs")?;
    }

    let (primary, extra) = split_startup_pages(pages);
    for page in extra {
        tracing::debug!(tab = %tab_handle(&page), "Closing extra startup tab");
        page.close().await.context("Failed to close startup tab")?;
    }
    Ok(primary)
}

fn split_startup_pages<T>(mut pages: Vec<T>) -> (Option<T>, Vec<T>) {
    if pages.is_empty() {
        return (None, pages);
    }
    let primary = pages.remove(0);
    (Some(primary), pages)
}

async fn launch_browser(
    settings: &BrowserSettings,
    profile_dir: &Path,
) -> Result<(Browser, chromiumoxide::handler::Handler)> {
    let chrome_path = match &settings.chrome_path {
        Some(path) => path.clone(),
        None => find_chrome()
            .context("Chrome/Chromium not found. Install it or set browser.chrome_path.")?,
    };
    let config = browser_config(settings, chrome_path, profile_dir)?;

    let (browser, handler) = Browser::launch(config)
        .await
        .context("Failed to launch browser")?;

    Ok((browser, handler))
}

fn browser_config(
    settings: &BrowserSettings,
    chrome_path: PathBuf,
    profile_dir: &Path,
) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .chrome_executable(chrome_path)
        .user_data_dir(profile_dir)
        .no_sandbox()
        .window_size(settings.window_width, settings.window_height)
        .viewport(Viewport {
            width: settings.window_width,
            height: settings.window_height,
            ..Viewport::default()
        })
        .request_timeout(settings.request_timeout)
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage");
    if !settings.headless {
        builder = builder.with_head();
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))
}

async fn apply_cookies(page: &Page, credentials: &[SessionCredential]) -> Result<()> {
    let cookies: Vec<CookieParam> = credentials
        .iter()
        .map(|credential| {
            let mut cookie = CookieParam::new(credential.name(), credential.value());
            cookie.url = Some(site::BASE_URL.to_string());
            cookie
        })
        .collect();

    if !cookies.is_empty() {
        page.set_cookies(cookies)
            .await
            .context("Failed to inject session cookies")?;
    }

    Ok(())
}

/// Find a Chrome/Chromium executable on `PATH` or in common install locations.
fn find_chrome() -> Option<PathBuf> {
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(PathBuf::from(path));
                }
            }
        }
    }

    [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ]
    .iter()
    .map(Path::new)
    .find(|path| path.exists())
    .map(Path::to_path_buf)
}
