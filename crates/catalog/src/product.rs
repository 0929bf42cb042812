use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vitrina_core::{CategoryId, DomainError, DomainResult, Entity, ProductId, UserId, ValueObject};

/// Maximum characters in a product name.
pub const NAME_MAX_CHARS: usize = 150;

/// Product price: non-negative, at most two decimal places and eight
/// integer digits. Always stored with a scale of exactly two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const DECIMAL_PLACES: u32 = 2;
    pub const INTEGER_DIGITS: u32 = 8;

    pub fn zero() -> Self {
        Self(Decimal::new(0, Self::DECIMAL_PLACES))
    }

    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation(
                "ensure this value is greater than or equal to 0",
            ));
        }

        // Trailing zeros count: "1.500" has three decimal places.
        if amount.scale() > Self::DECIMAL_PLACES {
            return Err(DomainError::validation(format!(
                "ensure that there are no more than {} decimal places",
                Self::DECIMAL_PLACES
            )));
        }

        let limit = Decimal::from(10_u64.pow(Self::INTEGER_DIGITS));
        if amount.abs().trunc() >= limit {
            return Err(DomainError::validation(format!(
                "ensure that there are no more than {} digits before the decimal point",
                Self::INTEGER_DIGITS
            )));
        }

        let mut amount = amount.abs();
        amount.rescale(Self::DECIMAL_PLACES);
        Ok(Self(amount))
    }

    /// Parse user input such as `"1299.90"`.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let amount = Decimal::from_str(raw.trim())
            .map_err(|_| DomainError::validation("enter a number"))?;
        Self::new(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::zero()
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl ValueObject for Price {}

/// A catalog product.
///
/// `owner` is set once, at creation, to the creating user and never changes
/// through editing. It is `None` only for records whose owner was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
    pub category: Option<CategoryId>,
    pub price: Price,
    pub owner: Option<UserId>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// A blank, unpublished product owned by `owner`.
    pub fn new(owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::new(),
            name: String::new(),
            description: String::new(),
            photo: None,
            category: None,
            price: Price::zero(),
            owner: Some(owner),
            is_published: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == Some(user)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
