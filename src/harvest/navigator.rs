use std::fmt;

use anyhow::Result;

/// Opaque identifier of a browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabHandle(String);

impl TabHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to read from a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Rendered text content, untrimmed.
    Text,
    /// Value of the named attribute.
    Attribute(&'static str),
}

/// A named value located by a CSS selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub selector: &'static str,
    pub extract: Extract,
}

/// A single authenticated browser session.
///
/// The session owns one primary tab for its whole lifetime and at most one
/// auxiliary tab at a time. Every read happens against the active tab.
///
/// Implementations report missing elements and attributes as
/// [`HarvestError`](super::HarvestError) so callers can downcast them.
#[async_trait::async_trait]
pub trait Navigator: Send {
    /// Tab that was active when the session was bootstrapped.
    fn primary_tab(&self) -> &TabHandle;

    /// Tab that navigation and reads currently target.
    fn active_tab(&self) -> &TabHandle;

    /// Load `url` in the active tab and wait for it to finish loading.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Open a blank auxiliary tab and make it active.
    async fn open_tab(&mut self) -> Result<TabHandle>;

    /// Close an auxiliary tab. The active handle is left untouched, so the
    /// caller must [`switch_to`](Navigator::switch_to) a live tab afterwards.
    async fn close_tab(&mut self, tab: &TabHandle) -> Result<()>;

    async fn switch_to(&mut self, tab: &TabHandle) -> Result<()>;

    /// Read `field` from the first element matching its selector.
    async fn read(&mut self, field: &Field) -> Result<String>;

    /// Find `container`, then every `entry` inside it in document order, and
    /// read each of `fields` relative to that entry.
    ///
    /// The outer vector has one element per entry, the inner one value per
    /// field in the order given.
    async fn read_entries(
        &mut self,
        container: &str,
        entry: &str,
        fields: &[Field],
    ) -> Result<Vec<Vec<String>>>;
}
