//! Marketplace payloads stored in the `ads` and `products` collections.

use crate::entity::Titled;
use crate::error::{Error, Result};

/// Whether an ad offers the machine for rent or for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AdKind {
    #[default]
    Rent,
    Sale,
}

/// Machine specification attached to an ad.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineSpecs {
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub hours: Option<u32>,
    pub condition: String,
}

/// Heavy machinery rental or sale ad.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ad {
    pub title: String,
    pub description: String,
    /// Price as entered by the seller, e.g. `2,500,000` or `negotiable`.
    pub price: String,
    pub kind: AdKind,
    pub category: String,
    pub province: String,
    pub city: String,
    pub featured: bool,
    pub specs: MachineSpecs,
    pub contact_name: String,
    pub contact_phone: String,
}

impl Ad {
    /// Checks the fields an ad cannot be posted without.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("category", &self.category),
            ("price", &self.price),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("ad {field} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Spare part or service offered in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Product {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: u64,
    pub specs: String,
    pub seller_id: String,
    pub seller_name: String,
}

impl Product {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "product name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload of any marketplace collection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Listing {
    Ad(Ad),
    Product(Product),
}

impl Listing {
    pub fn as_ad(&self) -> Option<&Ad> {
        match self {
            Self::Ad(ad) => Some(ad),
            Self::Product(_) => None,
        }
    }

    pub fn as_product(&self) -> Option<&Product> {
        match self {
            Self::Product(product) => Some(product),
            Self::Ad(_) => None,
        }
    }
}

impl Titled for Listing {
    fn title(&self) -> &str {
        match self {
            Self::Ad(ad) => &ad.title,
            Self::Product(product) => &product.name,
        }
    }
}
