//! Read-only product catalogue.
//!
//! The seed list lives in static memory for the whole process lifetime and is
//! never mutated, so it is shared between worker threads without locking.

use serde::Serialize;

/// A product offered on the products page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub price: f64,
    pub image: &'static str,
}

impl Product {
    /// Price formatted with two decimals, e.g. `149.99`.
    pub fn display_price(&self) -> String {
        format!("{:.2}", self.price)
    }
}

static PRODUCTS: [Product; 2] = [
    Product {
        id: 1,
        name: "Kindle E-Reader",
        description: "Lightweight e-reader with a glare-free display and weeks of battery life.",
        price: 149.99,
        image: "https://picsum.photos/id/367/800/600",
    },
    Product {
        id: 2,
        name: "Vintage Film Camera",
        description: "Capture timeless moments with this classic vintage film camera, perfect for photography enthusiasts.",
        price: 199.99,
        image: "https://picsum.photos/id/250/800/600",
    },
];

/// All products in catalogue order.
pub fn products() -> &'static [Product] {
    &PRODUCTS
}
