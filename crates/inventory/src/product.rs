use serde::{Deserialize, Serialize};

use bizpulse_core::{Entity, EntityId};

/// Stock classification used by alerts and inventory analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    OutOfStock,
    /// At or below `min_stock` but above zero.
    Low,
    Healthy,
}

/// Product as stored in `products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub stock: f64,
    #[serde(default)]
    pub min_stock: f64,
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub sale_price: f64,
}

impl Product {
    pub fn stock_status(&self) -> StockStatus {
        if self.stock <= 0.0 {
            StockStatus::OutOfStock
        } else if self.stock <= self.min_stock {
            StockStatus::Low
        } else {
            StockStatus::Healthy
        }
    }

    /// Stock valued at cost.
    pub fn stock_value(&self) -> f64 {
        self.stock.max(0.0) * self.cost_price
    }

    pub fn unit_margin(&self) -> f64 {
        self.sale_price - self.cost_price
    }
}

impl Entity for Product {
    const KIND: &'static str = "product";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: f64, min_stock: f64) -> Product {
        Product {
            id: EntityId::new("p1"),
            name: "Widget".into(),
            category: None,
            stock,
            min_stock,
            cost_price: 2.0,
            sale_price: 3.5,
        }
    }

    #[test]
    fn stock_status_boundaries() {
        assert_eq!(product(0.0, 10.0).stock_status(), StockStatus::OutOfStock);
        assert_eq!(product(10.0, 10.0).stock_status(), StockStatus::Low);
        assert_eq!(product(1.0, 10.0).stock_status(), StockStatus::Low);
        assert_eq!(product(11.0, 10.0).stock_status(), StockStatus::Healthy);
    }

    #[test]
    fn stock_value_ignores_negative_stock() {
        assert_eq!(product(4.0, 0.0).stock_value(), 8.0);
        assert_eq!(product(-3.0, 0.0).stock_value(), 0.0);
        assert_eq!(product(1.0, 0.0).unit_margin(), 1.5);
    }
}
