//! Cart line items and quantity coercion.
//!
//! Line items are persisted as JSON objects with the field names `id`,
//! `name`, `price`, `qty` and `image`. Stored data may have been written by
//! older page scripts, so deserialization is lenient: prices may be numbers
//! or text, quantities are clamped to at least one and empty image strings
//! are treated as absent.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::id::ProductId;
use crate::types::price::{Price, amount_from_f64, parse_amount};

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier, unique within a cart.
    #[serde(deserialize_with = "lenient_id")]
    pub id: ProductId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Unit price, never negative.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Decimal,
    /// Quantity, at least one.
    #[serde(
        rename = "qty",
        default = "default_quantity",
        deserialize_with = "lenient_quantity"
    )]
    pub quantity: u32,
    /// Optional product image URL.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_image"
    )]
    pub image: Option<String>,
}

impl LineItem {
    /// Create a line item, clamping the quantity to at least one.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: if price.is_sign_negative() {
                Decimal::ZERO
            } else {
                price
            },
            quantity: quantity.max(1),
            image: None,
        }
    }

    /// Attach an image URL; blank URLs are ignored.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        let image = image.into();
        self.image = if image.trim().is_empty() {
            None
        } else {
            Some(image)
        };
        self
    }

    /// Price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Unit price in the store currency.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::usd(self.price)
    }
}

/// Clamp a requested quantity to a whole number of at least one.
///
/// Fractions floor (`2.7` becomes 2); NaN, infinities and anything below one
/// become 1; values beyond `u32::MAX` saturate.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_quantity(requested: f64) -> u32 {
    if !requested.is_finite() || requested < 1.0 {
        return 1;
    }
    if requested >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    requested.floor() as u32
}

/// Parse a quantity typed into a form field.
///
/// Reads the leading integer the way a browser quantity input is parsed
/// (`"3 pcs"` is 3, `"2.7"` is 2) and clamps the result with
/// [`clamp_quantity`]. Input without leading digits becomes 1.
#[must_use]
pub fn parse_quantity(raw: &str) -> u32 {
    let s = raw.trim();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits_len = s
        .get(sign_len..)
        .map_or(0, |rest| rest.bytes().take_while(u8::is_ascii_digit).count());
    if digits_len == 0 {
        return 1;
    }
    s.get(..sign_len + digits_len)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .map_or(1, clamp_quantity)
}

const fn default_quantity() -> u32 {
    1
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProductId, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(ProductId::new(id)),
        Value::Number(id) => Ok(ProductId::new(id.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "line item id must be a string, got {other}"
        ))),
    }
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let price = match Value::deserialize(deserializer)? {
        Value::String(raw) => parse_amount(&raw),
        Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .ok()
            .or_else(|| n.as_f64().and_then(amount_from_f64))
            .unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    };
    Ok(if price.is_sign_negative() {
        Decimal::ZERO
    } else {
        price
    })
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map_or(1, clamp_quantity),
        Value::String(raw) => parse_quantity(&raw),
        _ => 1,
    })
}

fn lenient_image<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(url) if !url.trim().is_empty() => Some(url),
        _ => None,
    })
}
