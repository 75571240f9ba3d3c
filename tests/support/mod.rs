#![allow(dead_code)]

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use purchase_harvester::harvest::{
    site, Extract, Field, HarvestError, Navigator, TabHandle,
};
use scraper::{ElementRef, Html, Selector};

/// One purchase served by [`FakeSite`].
#[derive(Debug, Clone)]
pub struct FakePurchase {
    pub number: u64,
    pub status: String,
    pub date: String,
    pub total: i64,
    pub payment_method: String,
    /// Render the detail page without the `date | id` delimiter.
    pub malformed: bool,
}

impl FakePurchase {
    pub fn new(number: u64, status: &str, total: i64) -> Self {
        Self {
            number,
            status: status.to_string(),
            date: format!("{} de mayo de 2023", number % 28 + 1),
            total,
            payment_method: "Tarjeta Visa".to_string(),
            malformed: false,
        }
    }

    pub fn malformed(mut self) -> Self {
        self.malformed = true;
        self
    }

    pub fn id(&self) -> String {
        format!("#2000{:09}", self.number)
    }

    pub fn detail_url(&self) -> String {
        format!("{}/my_purchases/{}/detail", site::BASE_URL, self.number)
    }

    /// Relative link, as the list page renders it.
    fn detail_href(&self) -> String {
        format!("/my_purchases/{}/detail", self.number)
    }
}

#[derive(Debug)]
struct Tab {
    handle: TabHandle,
    url: Option<String>,
}

/// In-memory [`Navigator`] serving HTML fixtures keyed by URL.
///
/// Selectors are evaluated with `scraper`, so fixtures exercise the same CSS
/// the real site contract uses.
pub struct FakeSite {
    pages: HashMap<String, String>,
    tabs: Vec<Tab>,
    primary: TabHandle,
    active: TabHandle,
    next_tab: u32,
    /// Every URL loaded, in order.
    pub visits: Vec<String>,
    /// Largest number of tabs open at the same time.
    pub max_open_tabs: usize,
}

impl FakeSite {
    pub fn new() -> Self {
        let primary = TabHandle::new("tab-0");
        Self {
            pages: HashMap::new(),
            tabs: vec![Tab {
                handle: primary.clone(),
                url: Some(site::placeholder_url()),
            }],
            active: primary.clone(),
            primary,
            next_tab: 1,
            visits: Vec::new(),
            max_open_tabs: 1,
        }
    }

    /// A site whose list pages, summary and detail pages describe `purchases`.
    pub fn with_purchases(purchases: &[FakePurchase]) -> Self {
        let mut fake = Self::new().with_page(
            &site::list_url(),
            &summary_html(&format!("{} compras", purchases.len())),
        );
        for (index, chunk) in purchases.chunks(site::PAGE_SIZE as usize).enumerate() {
            let entries: Vec<(String, String)> = chunk
                .iter()
                .map(|p| (p.detail_href(), p.status.clone()))
                .collect();
            fake = fake.with_page(&site::list_page_url(index as u64 + 1), &list_html(&entries));
        }
        for purchase in purchases {
            let date_id = if purchase.malformed {
                format!("{} {}", purchase.date, purchase.id())
            } else {
                format!("{} | {}", purchase.date, purchase.id())
            };
            fake = fake.with_page(
                &purchase.detail_url(),
                &detail_html(
                    &date_id,
                    &thousands(purchase.total),
                    &purchase.payment_method,
                ),
            );
        }
        fake
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn open_tabs(&self) -> usize {
        self.tabs.len()
    }

    pub fn visit_count(&self, url: &str) -> usize {
        self.visits.iter().filter(|v| v.as_str() == url).count()
    }

    fn document(&self) -> Result<Html> {
        let tab = self
            .tabs
            .iter()
            .find(|t| t.handle == self.active)
            .ok_or_else(|| HarvestError::UnknownTab(self.active.to_string()))?;
        let url = tab
            .url
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("tab {} has no document", tab.handle))?;
        let html = self.pages.get(url).map(String::as_str).unwrap_or("");
        Ok(Html::parse_document(html))
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("bad selector {css}: {e:?}"))
}

fn extract(element: ElementRef<'_>, field: &Field) -> Result<String> {
    match field.extract {
        Extract::Text => Ok(element.text().collect()),
        Extract::Attribute(name) => element
            .value()
            .attr(name)
            .map(str::to_string)
            .ok_or_else(|| {
                HarvestError::MissingAttribute {
                    selector: field.selector.to_string(),
                    attribute: name.to_string(),
                }
                .into()
            }),
    }
}

fn not_found(css: &str) -> anyhow::Error {
    HarvestError::ElementNotFound {
        selector: css.to_string(),
    }
    .into()
}

#[async_trait]
impl Navigator for FakeSite {
    fn primary_tab(&self) -> &TabHandle {
        &self.primary
    }

    fn active_tab(&self) -> &TabHandle {
        &self.active
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        if !self.pages.contains_key(url) {
            anyhow::bail!("net::ERR_NAME_NOT_RESOLVED loading {url}");
        }
        let active = self.active.clone();
        let tab = self
            .tabs
            .iter_mut()
            .find(|t| t.handle == active)
            .ok_or_else(|| HarvestError::UnknownTab(active.to_string()))?;
        tab.url = Some(url.to_string());
        self.visits.push(url.to_string());
        Ok(())
    }

    async fn open_tab(&mut self) -> Result<TabHandle> {
        if self.tabs.len() >= 2 {
            return Err(HarvestError::AuxiliaryTabOpen.into());
        }
        let handle = TabHandle::new(format!("tab-{}", self.next_tab));
        self.next_tab += 1;
        self.tabs.push(Tab {
            handle: handle.clone(),
            url: None,
        });
        self.active = handle.clone();
        self.max_open_tabs = self.max_open_tabs.max(self.tabs.len());
        Ok(handle)
    }

    async fn close_tab(&mut self, tab: &TabHandle) -> Result<()> {
        if *tab == self.primary {
            return Err(HarvestError::PrimaryTabClose.into());
        }
        let before = self.tabs.len();
        self.tabs.retain(|t| t.handle != *tab);
        if self.tabs.len() == before {
            return Err(HarvestError::UnknownTab(tab.to_string()).into());
        }
        Ok(())
    }

    async fn switch_to(&mut self, tab: &TabHandle) -> Result<()> {
        if !self.tabs.iter().any(|t| t.handle == *tab) {
            return Err(HarvestError::UnknownTab(tab.to_string()).into());
        }
        self.active = tab.clone();
        Ok(())
    }

    async fn read(&mut self, field: &Field) -> Result<String> {
        let document = self.document()?;
        let sel = selector(field.selector)?;
        let element = document
            .select(&sel)
            .next()
            .ok_or_else(|| not_found(field.selector))?;
        extract(element, field)
    }

    async fn read_entries(
        &mut self,
        container: &str,
        entry: &str,
        fields: &[Field],
    ) -> Result<Vec<Vec<String>>> {
        let document = self.document()?;
        let container_sel = selector(container)?;
        let entry_sel = selector(entry)?;
        let container_el = document
            .select(&container_sel)
            .next()
            .ok_or_else(|| not_found(container))?;

        let mut rows = Vec::new();
        for entry_el in container_el.select(&entry_sel) {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                let sel = selector(field.selector)?;
                let element = entry_el
                    .select(&sel)
                    .next()
                    .ok_or_else(|| not_found(field.selector))?;
                values.push(extract(element, field)?);
            }
            rows.push(values);
        }
        Ok(rows)
    }
}

/// Render `1234567` as `1.234.567`.
pub fn thousands(amount: i64) -> String {
    let digits = amount.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

pub fn summary_html(text: &str) -> String {
    format!(
        r#"<html><body>
        <div class="list-header__subtitle"><span>{text}</span><span>Últimos 12 meses</span></div>
        </body></html>"#
    )
}

pub fn list_html(entries: &[(String, String)]) -> String {
    let items: String = entries
        .iter()
        .map(|(href, status)| {
            format!(
                r#"<div class="list-item-grouper">
                  <div class="list-item__intro"><span class="bf-ui-rich-text">
                    {status}
                  </span></div>
                  <a class="andes-button andes-button--loud" href="{href}">Ver compra</a>
                </div>"#
            )
        })
        .collect();
    format!(r#"<html><body><div class="list-item-container">{items}</div></body></html>"#)
}

pub fn detail_html(date_id: &str, price: &str, payment_method: &str) -> String {
    format!(
        r#"<html><head><meta itemprop="price" content="{price}"></head><body>
        <div class="bf-ui-ticket__subtitle"><span>{date_id}</span><span>Ayuda</span></div>
        <div class="bf-ui-ticket-row__right-column--secondary-text">
          <span>Pagaste con</span><span> {payment_method} </span>
        </div>
        </body></html>"#
    )
}
