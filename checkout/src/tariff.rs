//! Tariff catalog: the priced list of sellable item codes.
//!
//! Prices are always looked up by item code, never derived from a category.
//! A catalog is loaded once per checkout session and is immutable afterwards.

use crate::error::CatalogError;
use crate::types::{ItemCode, Rupees, TicketCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// One priced item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffEntry {
    /// Unique item code
    pub code: ItemCode,
    /// Label shown to the visitor and sent with the booking
    pub label: String,
    /// Unit price
    pub price: Rupees,
    /// Category tag
    pub category: TicketCategory,
    /// Rank used to order items within the storefront
    pub display_order: u32,
}

impl TariffEntry {
    /// Creates a tariff entry
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        label: impl Into<String>,
        price: u64,
        category: TicketCategory,
        display_order: u32,
    ) -> Self {
        Self {
            code: ItemCode::new(code),
            label: label.into(),
            price: Rupees::new(price),
            category,
            display_order,
        }
    }
}

/// The immutable price list for a checkout session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TariffCatalog {
    /// Entries sorted by display order, then code
    entries: Vec<TariffEntry>,
    index: HashMap<ItemCode, usize>,
}

impl TariffCatalog {
    /// Builds a catalog, rejecting duplicate item codes
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateCode`] if two entries share a code.
    pub fn new(mut entries: Vec<TariffEntry>) -> Result<Self, CatalogError> {
        entries.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.code.cmp(&b.code))
        });

        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.code.clone(), position).is_some() {
                return Err(CatalogError::DuplicateCode(entry.code.clone()));
            }
        }

        Ok(Self { entries, index })
    }

    /// Parses a JSON array of tariff entries
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Malformed`] for invalid JSON and
    /// [`CatalogError::DuplicateCode`] for repeated codes.
    pub fn from_json(document: &str) -> Result<Self, CatalogError> {
        let entries: Vec<TariffEntry> = serde_json::from_str(document)?;
        Self::new(entries)
    }

    /// The park's standard tariff
    #[must_use]
    pub fn standard() -> Self {
        use TicketCategory::{Camera, Entry, Parking, Transport};

        let entries = vec![
            TariffEntry::new("zoo_adult", "Zoo entry (adult)", 50, Entry, 10),
            TariffEntry::new("zoo_child", "Zoo entry (child 5-12 years)", 20, Entry, 20),
            TariffEntry::new("zoo_senior", "Zoo entry (senior citizen)", 25, Entry, 30),
            TariffEntry::new("safari_adult", "Lion safari (adult)", 100, Entry, 40),
            TariffEntry::new("safari_child", "Lion safari (child)", 50, Entry, 50),
            TariffEntry::new("aquarium_adult", "Aquarium (adult)", 30, Entry, 60),
            TariffEntry::new("aquarium_child", "Aquarium (child)", 15, Entry, 70),
            TariffEntry::new("parking_2w", "Parking (two-wheeler)", 20, Parking, 110),
            TariffEntry::new("parking_4w_lmv", "Parking (car / LMV)", 50, Parking, 120),
            TariffEntry::new("parking_bus", "Parking (bus / HMV)", 150, Parking, 130),
            TariffEntry::new("battery_car_adult", "Battery vehicle (adult)", 60, Transport, 210),
            TariffEntry::new("battery_car_child", "Battery vehicle (child)", 30, Transport, 220),
            TariffEntry::new("toy_train", "Toy train", 20, Transport, 230),
            TariffEntry::new("camera_still", "Still camera", 50, Camera, 310),
            TariffEntry::new("camera_video", "Video camera", 150, Camera, 320),
        ];

        Self::new(entries).unwrap_or_default()
    }

    /// Looks up an entry
    #[must_use]
    pub fn get(&self, code: &ItemCode) -> Option<&TariffEntry> {
        self.index.get(code).map(|&position| &self.entries[position])
    }

    /// Unit price of an item
    #[must_use]
    pub fn price(&self, code: &ItemCode) -> Option<Rupees> {
        self.get(code).map(|entry| entry.price)
    }

    /// All entries in display order
    #[must_use]
    pub fn entries(&self) -> &[TariffEntry] {
        &self.entries
    }

    /// Entries of one category in display order
    pub fn in_category(&self, category: TicketCategory) -> impl Iterator<Item = &TariffEntry> {
        self.entries.iter().filter(move |entry| entry.category == category)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result type for pricing sources
pub type PricingResult = Result<TariffCatalog, CatalogError>;

/// Where a session's tariff comes from
pub trait PricingSource: Send + Sync {
    /// Load the tariff for a new checkout session
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the tariff cannot be fetched or parsed.
    fn load(&self) -> Pin<Box<dyn Future<Output = PricingResult> + Send + '_>>;
}

/// Pricing source that always returns the same catalog
#[derive(Clone, Debug)]
pub struct StaticPricingSource {
    catalog: TariffCatalog,
}

impl StaticPricingSource {
    /// Wraps a catalog
    #[must_use]
    pub const fn new(catalog: TariffCatalog) -> Self {
        Self { catalog }
    }
}

impl Default for StaticPricingSource {
    fn default() -> Self {
        Self::new(TariffCatalog::standard())
    }
}

impl PricingSource for StaticPricingSource {
    fn load(&self) -> Pin<Box<dyn Future<Output = PricingResult> + Send + '_>> {
        Box::pin(async move { Ok(self.catalog.clone()) })
    }
}

/// Pricing source that fetches a JSON tariff over HTTP
#[derive(Clone, Debug)]
pub struct HttpPricingSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPricingSource {
    /// Creates a source reading from `url`
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

impl PricingSource for HttpPricingSource {
    fn load(&self) -> Pin<Box<dyn Future<Output = PricingResult> + Send + '_>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

            if !response.status().is_success() {
                return Err(CatalogError::Unavailable(format!(
                    "pricing source returned status {}",
                    response.status()
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
            let catalog = TariffCatalog::from_json(&body)?;

            tracing::info!(entries = catalog.len(), url = %self.url, "Loaded tariff");
            Ok(catalog)
        })
    }
}
