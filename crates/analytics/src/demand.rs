use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use bizpulse_core::EntityId;
use bizpulse_inventory::Product;
use bizpulse_sales::{SalesInvoice, quantity_sold};

use crate::settings::ForecastSettings;

/// `days_until_empty` when nothing is selling.
pub const NO_DEPLETION_DAYS: f64 = 9_999.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDemand {
    pub product_id: EntityId,
    pub name: String,
    pub stock: f64,
    /// Average units sold per day over the trailing window.
    pub velocity: f64,
    pub days_until_empty: f64,
    /// Units needed to cover the reorder horizon, never negative.
    pub reorder_quantity: f64,
    /// Sales value of `reorder_quantity` at the product's sale price.
    #[serde(default)]
    pub reorder_value: f64,
}

impl ProductDemand {
    pub fn is_fast_mover(&self) -> bool {
        self.velocity >= 1.0
    }

    pub fn is_slow_mover(&self) -> bool {
        self.velocity == 0.0 && self.stock > 0.0
    }
}

pub fn product_demand(
    product: &Product,
    sales: &[SalesInvoice],
    today: NaiveDate,
    settings: &ForecastSettings,
) -> ProductDemand {
    let window = settings.velocity_window_days.max(1);
    let since = today - Duration::days(window);
    let sold = quantity_sold(sales, &product.id, since);
    let velocity = sold / window as f64;

    let days_until_empty = if velocity > 0.0 {
        product.stock.max(0.0) / velocity
    } else {
        NO_DEPLETION_DAYS
    };
    let reorder_quantity =
        (velocity * settings.reorder_horizon_days as f64 - product.stock).max(0.0);

    ProductDemand {
        product_id: product.id.clone(),
        name: product.name.clone(),
        stock: product.stock,
        velocity,
        days_until_empty,
        reorder_quantity,
        reorder_value: reorder_quantity * product.sale_price.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizpulse_sales::InvoiceLine;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn product(stock: f64) -> Product {
        Product {
            id: EntityId::new("p1"),
            name: "Widget".into(),
            category: None,
            stock,
            min_stock: 5.0,
            cost_price: 2.0,
            sale_price: 3.0,
        }
    }

    fn sale(days_ago: i64, quantity: f64) -> SalesInvoice {
        SalesInvoice {
            id: EntityId::generate(),
            customer_id: None,
            customer_name: None,
            date: today() - Duration::days(days_ago),
            items: vec![InvoiceLine {
                product_id: EntityId::new("p1"),
                product_name: None,
                quantity,
                unit_price: 3.0,
            }],
            total: quantity * 3.0,
            payment_method: None,
        }
    }

    #[test]
    fn velocity_and_reorder() {
        let sales = vec![sale(1, 30.0), sale(10, 30.0), sale(45, 500.0)];
        let d = product_demand(&product(20.0), &sales, today(), &ForecastSettings::default());

        assert_eq!(d.velocity, 2.0);
        assert_eq!(d.days_until_empty, 10.0);
        assert_eq!(d.reorder_quantity, 40.0);
        assert_eq!(d.reorder_value, 120.0);
        assert!(d.is_fast_mover());
    }

    #[test]
    fn no_sales_uses_sentinel() {
        let d = product_demand(&product(20.0), &[], today(), &ForecastSettings::default());
        assert_eq!(d.days_until_empty, NO_DEPLETION_DAYS);
        assert_eq!(d.reorder_quantity, 0.0);
        assert!(d.is_slow_mover());
    }
}
