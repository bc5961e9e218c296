//! Value objects shared by every checkout component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable key of a sellable item (for example `zoo_adult` or `parking_4w_lmv`)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(String);

impl ItemCode {
    /// Creates an item code
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Server-issued handle of a created booking.
///
/// There is deliberately no constructor that invents one: the only way to
/// obtain a `TicketId` is from a booking response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Accepts an identifier returned by the booking service.
    ///
    /// Blank identifiers are rejected.
    #[must_use]
    pub fn from_server(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Money Value Object (whole rupees)
// ============================================================================

/// An amount in whole rupees. Never negative.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rupees(u64);

impl Rupees {
    /// Zero rupees
    pub const ZERO: Self = Self(0);

    /// Creates an amount
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// The amount in whole rupees
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Unit price times a quantity, saturating at `u64::MAX`
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// Adds two amounts, saturating at `u64::MAX`
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Add for Rupees {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl Sum for Rupees {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Rupees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

// ============================================================================
// Tariff categories
// ============================================================================

/// Category of a sellable item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    /// Entry tickets (zoo, safari and aquarium add-ons)
    Entry,
    /// Vehicle parking
    Parking,
    /// In-park transport (battery vehicles, toy train)
    Transport,
    /// Camera permits
    Camera,
}

impl TicketCategory {
    /// Every category in display order
    pub const ALL: [Self; 4] = [Self::Entry, Self::Parking, Self::Transport, Self::Camera];
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entry => "entry",
            Self::Parking => "parking",
            Self::Transport => "transport",
            Self::Camera => "camera",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Visitor
// ============================================================================

/// A visitor field that can fail validation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitorField {
    /// Visitor name
    Name,
    /// Mobile number
    Mobile,
    /// Email address
    Email,
}

impl fmt::Display for VisitorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Mobile => "mobile number",
            Self::Email => "email",
        };
        f.write_str(name)
    }
}

/// Contact details typed into the checkout form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorDetails {
    /// Visitor name
    pub name: String,
    /// Email address
    pub email: String,
    /// Mobile number
    pub mobile: String,
}

impl VisitorDetails {
    /// Creates visitor details
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        mobile: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            mobile: mobile.into(),
        }
    }

    /// Whether name and mobile differ from `other` (ignoring surrounding whitespace)
    #[must_use]
    pub fn contact_differs(&self, other: &Self) -> bool {
        self.name.trim() != other.name.trim() || self.mobile.trim() != other.mobile.trim()
    }
}

/// Mobile number with all but the last four digits hidden, for notices and logs
#[must_use]
pub fn mask_mobile(mobile: &str) -> String {
    let chars: Vec<char> = mobile.trim().chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let mut masked = "*".repeat(hidden);
    masked.extend(&chars[hidden..]);
    masked
}

// ============================================================================
// Booking options
// ============================================================================

/// How the booking will be paid for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Paid through the online payment page after the booking is created
    #[default]
    Online,
}

/// Language of the date strip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    /// English
    #[default]
    English,
    /// Hindi
    Hindi,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "hi" | "hindi" => Ok(Self::Hindi),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}
