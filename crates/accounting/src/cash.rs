use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bizpulse_core::{DomainResult, Entity, EntityId};
use bizpulse_store::{Collections, DocumentStore, keys};

/// Well-known ledger categories.
pub mod categories {
    pub const SALES: &str = "sales";
    pub const PURCHASES: &str = "purchases";
    pub const INSTALLMENTS: &str = "installments";
    pub const OTHER: &str = "other";
}

/// How money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Check,
    Installment,
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Check => "check",
            PaymentMethod::Installment => "installment",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashTransaction {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub reference_id: Option<EntityId>,
    pub date: NaiveDate,
}

impl CashTransaction {
    pub fn income(amount: f64, category: &str, date: NaiveDate) -> Self {
        Self::new(TransactionType::Income, amount, category, date)
    }

    pub fn expense(amount: f64, category: &str, date: NaiveDate) -> Self {
        Self::new(TransactionType::Expense, amount, category, date)
    }

    fn new(kind: TransactionType, amount: f64, category: &str, date: NaiveDate) -> Self {
        Self {
            id: EntityId::generate(),
            kind,
            amount,
            category: category.to_string(),
            description: String::new(),
            payment_method: PaymentMethod::Cash,
            reference_id: None,
            date,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_reference(mut self, reference_id: EntityId) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    /// Signed amount: income positive, expense negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

impl Entity for CashTransaction {
    const KIND: &'static str = "cash_transaction";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Cached running balance, refreshed after every ledger append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashBalanceSnapshot {
    pub balance: f64,
    pub updated_at: DateTime<Utc>,
}

/// Balance of a set of ledger rows.
pub fn balance_of(transactions: &[CashTransaction]) -> f64 {
    transactions.iter().map(CashTransaction::signed_amount).sum()
}

/// Net flow (income − expense) of rows dated within `[from, to]`.
pub fn net_flow(transactions: &[CashTransaction], from: NaiveDate, to: NaiveDate) -> f64 {
    transactions
        .iter()
        .filter(|t| t.date >= from && t.date <= to)
        .map(CashTransaction::signed_amount)
        .sum()
}

/// Append-only cash ledger over the `cash_transactions` collection.
#[derive(Debug, Clone)]
pub struct CashLedger<S> {
    collections: Collections<S>,
}

impl<S> CashLedger<S>
where
    S: DocumentStore,
{
    pub fn new(collections: Collections<S>) -> Self {
        Self { collections }
    }

    /// Append a row and refresh the `cash_balance` snapshot.
    pub fn record(&self, transaction: CashTransaction, at: DateTime<Utc>) -> DomainResult<f64> {
        let balance = self
            .collections
            .update_collection::<CashTransaction, f64, _>(keys::CASH_TRANSACTIONS, |rows| {
                rows.push(transaction.clone());
                Ok(balance_of(rows))
            })?;

        debug!(
            category = %transaction.category,
            amount = transaction.amount,
            balance,
            "cash ledger row recorded"
        );

        self.collections.set_collection(
            keys::CASH_BALANCE,
            &[CashBalanceSnapshot {
                balance,
                updated_at: at,
            }],
        )?;

        Ok(balance)
    }

    pub fn transactions(&self) -> Vec<CashTransaction> {
        self.collections
            .get_collection(keys::CASH_TRANSACTIONS, Vec::new())
    }

    /// Current balance, recomputed from the ledger (the snapshot is a cache).
    pub fn balance(&self) -> f64 {
        balance_of(&self.transactions())
    }

    pub fn snapshot(&self) -> Option<CashBalanceSnapshot> {
        self.collections
            .get_collection::<CashBalanceSnapshot>(keys::CASH_BALANCE, Vec::new())
            .into_iter()
            .next()
    }

    pub fn by_reference(&self, reference_id: &EntityId) -> Vec<CashTransaction> {
        self.transactions()
            .into_iter()
            .filter(|t| t.reference_id.as_ref() == Some(reference_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizpulse_store::InMemoryDocumentStore;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn test_ledger() -> CashLedger<Arc<InMemoryDocumentStore>> {
        CashLedger::new(Collections::new(Arc::new(InMemoryDocumentStore::new())))
    }

    #[test]
    fn record_appends_and_refreshes_snapshot() {
        let ledger = test_ledger();
        let at = Utc::now();

        ledger
            .record(CashTransaction::income(250.0, categories::SALES, d(1)), at)
            .unwrap();
        let balance = ledger
            .record(CashTransaction::expense(100.0, categories::PURCHASES, d(2)), at)
            .unwrap();

        assert_eq!(balance, 150.0);
        assert_eq!(ledger.transactions().len(), 2);
        assert_eq!(ledger.balance(), 150.0);
        assert_eq!(ledger.snapshot().unwrap().balance, 150.0);
    }

    #[test]
    fn net_flow_only_counts_window() {
        let rows = vec![
            CashTransaction::income(100.0, categories::SALES, d(1)),
            CashTransaction::expense(300.0, categories::PURCHASES, d(10)),
            CashTransaction::income(50.0, categories::OTHER, d(20)),
        ];
        assert_eq!(net_flow(&rows, d(5), d(30)), -250.0);
        assert_eq!(balance_of(&rows), -150.0);
    }

    #[test]
    fn serializes_type_field_in_lowercase() {
        let tx = CashTransaction::income(10.0, categories::OTHER, d(1))
            .with_payment_method(PaymentMethod::Check);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "income");
        assert_eq!(json["paymentMethod"], "check");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: the ledger balance equals incomes minus expenses for any
        /// append sequence.
        #[test]
        fn balance_is_income_minus_expense(
            rows in prop::collection::vec((any::<bool>(), 1u32..100_000u32), 1..20)
        ) {
            let ledger = test_ledger();
            let mut expected = 0.0;
            for (is_income, amount) in rows {
                let amount = amount as f64;
                let tx = if is_income {
                    expected += amount;
                    CashTransaction::income(amount, categories::OTHER, d(1))
                } else {
                    expected -= amount;
                    CashTransaction::expense(amount, categories::OTHER, d(1))
                };
                ledger.record(tx, Utc::now()).unwrap();
            }
            prop_assert!((ledger.balance() - expected).abs() < 1e-6);
        }
    }
}
