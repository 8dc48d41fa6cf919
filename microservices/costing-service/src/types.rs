//! Costing Types

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub type ConfigurationId = u64;

/// A numeric field kept exactly as the caller sent it.
///
/// Accepts a JSON number, a string holding a number (`"10"`, `" 2.5 "`) or
/// `null`. Anything else fails deserialization. The raw JSON is what gets
/// stored; [`Amount::to_decimal`] is the calculator's view of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Amount(Value);

impl Amount {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Exact decimal value. `None` for `null` and for magnitudes `Decimal` cannot hold.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match &self.0 {
            Value::Number(n) => number_to_decimal(n),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }
    }
}

fn number_to_decimal(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    n.as_f64().and_then(Decimal::from_f64)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
        .or_else(|| s.parse::<f64>().ok().and_then(Decimal::from_f64))
}

fn is_numeric(s: &str) -> bool {
    s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Null | Value::Number(_) => Ok(Amount(value)),
            Value::String(s) if is_numeric(s) => Ok(Amount(value)),
            other => Err(de::Error::custom(format!("expected a number, found {}", other))),
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount(Value::from(value))
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount(Value::String(value.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keeps an explicit `null` as `Some`, so it is written back on save
fn present<'de, D>(deserializer: D) -> Result<Option<Amount>, D::Error>
where
    D: Deserializer<'de>,
{
    Amount::deserialize(deserializer).map(Some)
}

/// A single priced line inside a cost category.
///
/// Fields other than `price` and `quantity` (typically `name`) are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price: Option<Amount>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Amount>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    pub const DEFAULT_PRICE: Decimal = Decimal::ZERO;
    pub const DEFAULT_QUANTITY: Decimal = Decimal::ONE;

    pub fn new(price: impl Into<Amount>, quantity: impl Into<Amount>) -> Self {
        Self {
            price: Some(price.into()),
            quantity: Some(quantity.into()),
            extra: Map::new(),
        }
    }

    pub fn named(name: &str, price: impl Into<Amount>, quantity: impl Into<Amount>) -> Self {
        let mut item = Self::new(price, quantity);
        item.extra.insert("name".to_string(), Value::String(name.to_string()));
        item
    }
}

/// A costing configuration as submitted by a caller.
///
/// Only `items`, `batch_size` and `selling_price` carry meaning for the
/// calculator. Everything else (`name`, `container_type`, ...) is opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Category key -> line items, in the order the caller supplied them
    #[serde(default)]
    pub items: IndexMap<String, Vec<LineItem>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<Amount>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<Amount>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Configuration {
    pub fn new(batch_size: impl Into<Amount>, selling_price: impl Into<Amount>) -> Self {
        Self {
            batch_size: Some(batch_size.into()),
            selling_price: Some(selling_price.into()),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, category: &str, item: LineItem) -> Self {
        self.items.entry(category.to_string()).or_default().push(item);
        self
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Display name, when the caller supplied one
    pub fn name(&self) -> Option<&str> {
        self.extra.get("name").and_then(Value::as_str)
    }
}

/// A configuration as held by the store: the caller's body plus the
/// store-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredConfiguration {
    pub id: ConfigurationId,
    /// ISO-8601 creation time, kept verbatim once written
    pub created_at: String,
    #[serde(flatten)]
    pub configuration: Configuration,
}

/// Fixed cost categories offered to callers building a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    RawMaterials,
    Packaging,
    Logistics,
    Taxes,
    Labor,
    Rent,
    Other,
}

impl CostCategory {
    pub const ALL: [CostCategory; 7] = [
        CostCategory::RawMaterials,
        CostCategory::Packaging,
        CostCategory::Logistics,
        CostCategory::Taxes,
        CostCategory::Labor,
        CostCategory::Rent,
        CostCategory::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::RawMaterials => "raw_materials",
            Self::Packaging => "packaging",
            Self::Logistics => "logistics",
            Self::Taxes => "taxes",
            Self::Labor => "labor",
            Self::Rent => "rent",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::RawMaterials => "Сырье",
            Self::Packaging => "Упаковка",
            Self::Logistics => "Логистика",
            Self::Taxes => "Налоги",
            Self::Labor => "Работа",
            Self::Rent => "Аренда",
            Self::Other => "Другие расходы",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Label for a category key; `None` for keys outside the fixed table
    pub fn label_for(key: &str) -> Option<&'static str> {
        Self::from_key(key).map(|c| c.label())
    }
}

/// Entry of the public category table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub key: String,
    pub label: String,
}

impl From<CostCategory> for CategoryInfo {
    fn from(category: CostCategory) -> Self {
        Self {
            key: category.key().to_string(),
            label: category.label().to_string(),
        }
    }
}

/// Unit economics derived from a configuration. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub total_cost: f64,
    pub category_totals: IndexMap<String, f64>,
    pub unit_cost: f64,
    pub profit_per_unit: f64,
    pub margin_percent: f64,
    pub batch_profit: f64,
    pub batch_size: f64,
    pub selling_price: f64,
}
