use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizpulse_accounting::PaymentMethod;
use bizpulse_core::{Entity, EntityId};

/// Contact information for a party.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Discrete risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl core::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Overdue,
}

/// One row of a party's payment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Check / installment / invoice this row tracks, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<EntityId>,
}

impl PaymentRecord {
    pub fn new(date: NaiveDate, amount: f64, method: PaymentMethod, status: PaymentStatus) -> Self {
        Self {
            date,
            amount,
            method,
            status,
            reference_id: None,
        }
    }

    pub fn with_reference(mut self, reference_id: EntityId) -> Self {
        self.reference_id = Some(reference_id);
        self
    }
}

/// Flip the pending row that tracks `reference_id` to `status`.
///
/// Rows written before references were recorded are matched on
/// (method, amount, pending) instead. Returns whether a row was updated.
pub fn settle_history_row(
    history: &mut [PaymentRecord],
    reference_id: &EntityId,
    method: PaymentMethod,
    amount: f64,
    status: PaymentStatus,
) -> bool {
    let by_reference = history.iter().position(|r| {
        r.status == PaymentStatus::Pending && r.reference_id.as_ref() == Some(reference_id)
    });
    let idx = by_reference.or_else(|| {
        history.iter().position(|r| {
            r.status == PaymentStatus::Pending
                && r.reference_id.is_none()
                && r.method == method
                && (r.amount - amount).abs() < f64::EPSILON
        })
    });

    match idx {
        Some(i) => {
            history[i].status = status;
            true
        }
        None => false,
    }
}

/// Customer record plus derived aggregate fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAggregate {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub total_purchases: f64,
    #[serde(default)]
    pub total_debt: f64,
    #[serde(default)]
    pub pending_checks_amount: f64,
    #[serde(default)]
    pub overdue_installments_amount: f64,
    #[serde(default)]
    pub average_order_value: f64,
    /// Orders per month.
    #[serde(default)]
    pub purchase_frequency: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub loyalty_points: u64,
    #[serde(default)]
    pub last_purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_history: Vec<PaymentRecord>,
}

impl CustomerAggregate {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            contact: ContactInfo::default(),
            total_purchases: 0.0,
            total_debt: 0.0,
            pending_checks_amount: 0.0,
            overdue_installments_amount: 0.0,
            average_order_value: 0.0,
            purchase_frequency: 0.0,
            risk_level: RiskLevel::Low,
            loyalty_points: 0,
            last_purchase_date: None,
            payment_history: Vec::new(),
        }
    }

    pub fn settle_history(
        &mut self,
        reference_id: &EntityId,
        method: PaymentMethod,
        amount: f64,
        status: PaymentStatus,
    ) -> bool {
        settle_history_row(&mut self.payment_history, reference_id, method, amount, status)
    }
}

impl Entity for CustomerAggregate {
    const KIND: &'static str = "customer";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Supplier record plus derived aggregate fields (no loyalty points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierAggregate {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub total_purchases: f64,
    #[serde(default)]
    pub total_debt: f64,
    #[serde(default)]
    pub pending_checks_amount: f64,
    #[serde(default)]
    pub overdue_installments_amount: f64,
    #[serde(default)]
    pub average_order_value: f64,
    #[serde(default)]
    pub purchase_frequency: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Average quality/delivery rating on a 1–5 scale, when rated.
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub last_purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_history: Vec<PaymentRecord>,
}

impl SupplierAggregate {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            contact: ContactInfo::default(),
            total_purchases: 0.0,
            total_debt: 0.0,
            pending_checks_amount: 0.0,
            overdue_installments_amount: 0.0,
            average_order_value: 0.0,
            purchase_frequency: 0.0,
            risk_level: RiskLevel::Low,
            average_rating: None,
            last_purchase_date: None,
            payment_history: Vec::new(),
        }
    }

    pub fn settle_history(
        &mut self,
        reference_id: &EntityId,
        method: PaymentMethod,
        amount: f64,
        status: PaymentStatus,
    ) -> bool {
        settle_history_row(&mut self.payment_history, reference_id, method, amount, status)
    }
}

impl Entity for SupplierAggregate {
    const KIND: &'static str = "supplier";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
