//! Read-modify-write of customer/supplier aggregates per domain event.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use bizpulse_accounting::{CashLedger, CashTransaction, PaymentMethod, categories};
use bizpulse_core::entity::find_mut;
use bizpulse_core::{Clock, DomainError, DomainResult, EntityId, months_between};
use bizpulse_purchasing::{PurchaseInvoice, supplier_stats};
use bizpulse_sales::{SalesInvoice, customer_stats};
use bizpulse_store::{Collections, DocumentStore, keys};

use crate::party::{CustomerAggregate, PaymentRecord, PaymentStatus, SupplierAggregate};
use crate::risk::RiskScorer;

/// Lower bound for the first→last sale span, in months. A single sale therefore
/// yields `frequency == sales_count`.
pub const MIN_MONTH_SPAN: f64 = 1.0;

/// Sale side of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    #[serde(default)]
    pub invoice_id: Option<EntityId>,
    pub total: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

/// Purchase side of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    #[serde(default)]
    pub invoice_id: Option<EntityId>,
    pub total: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPayment {
    pub installment_id: EntityId,
    pub amount: f64,
    pub date: NaiveDate,
}

/// Whether a modification re-derives `risk_level` afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rescore {
    Derive,
    /// Keep whatever the modification set (e.g. a forced override).
    Keep,
}

/// Keeps customer/supplier aggregates consistent with sales, purchases and payments.
///
/// Missing parties are never an exception to the caller's flow: the update is
/// skipped, logged, and reported as `DomainError::NotFound`.
#[derive(Debug, Clone)]
pub struct AggregateUpdater<S, C> {
    collections: Collections<S>,
    ledger: CashLedger<S>,
    clock: C,
    scorer: RiskScorer,
}

impl<S, C> AggregateUpdater<S, C>
where
    S: DocumentStore + Clone,
    C: Clock,
{
    pub fn new(collections: Collections<S>, clock: C) -> Self {
        Self {
            ledger: CashLedger::new(collections.clone()),
            collections,
            clock,
            scorer: RiskScorer::default(),
        }
    }

    pub fn with_scorer(mut self, scorer: RiskScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    pub fn customers(&self) -> Vec<CustomerAggregate> {
        self.collections.get_collection(keys::CUSTOMERS, Vec::new())
    }

    pub fn customer(&self, id: &EntityId) -> Option<CustomerAggregate> {
        self.customers().into_iter().find(|c| &c.id == id)
    }

    pub fn suppliers(&self) -> Vec<SupplierAggregate> {
        self.collections.get_collection(keys::SUPPLIERS, Vec::new())
    }

    pub fn supplier(&self, id: &EntityId) -> Option<SupplierAggregate> {
        self.suppliers().into_iter().find(|s| &s.id == id)
    }

    /// Insert or replace a customer record.
    pub fn register_customer(&self, customer: CustomerAggregate) -> DomainResult<()> {
        self.collections
            .update_collection::<CustomerAggregate, (), _>(keys::CUSTOMERS, |rows| {
                upsert(rows, customer.clone(), |c| &c.id);
                Ok(())
            })
    }

    /// Insert or replace a supplier record.
    pub fn register_supplier(&self, supplier: SupplierAggregate) -> DomainResult<()> {
        self.collections
            .update_collection::<SupplierAggregate, (), _>(keys::SUPPLIERS, |rows| {
                upsert(rows, supplier.clone(), |s| &s.id);
                Ok(())
            })
    }

    /// Apply `f` to one customer record and write it back.
    pub fn modify_customer<F>(
        &self,
        customer_id: &EntityId,
        rescore: Rescore,
        mut f: F,
    ) -> DomainResult<CustomerAggregate>
    where
        F: FnMut(&mut CustomerAggregate),
    {
        let scorer = &self.scorer;
        self.collections
            .update_collection::<CustomerAggregate, CustomerAggregate, _>(keys::CUSTOMERS, |rows| {
                let customer = find_mut(rows, customer_id)
                    .ok_or_else(|| DomainError::not_found("customer", customer_id))?;
                f(customer);
                customer.total_debt = customer.total_debt.max(0.0);
                if rescore == Rescore::Derive {
                    customer.risk_level = scorer.customer_risk(customer);
                }
                Ok(customer.clone())
            })
    }

    /// Apply `f` to one supplier record and write it back.
    pub fn modify_supplier<F>(
        &self,
        supplier_id: &EntityId,
        rescore: Rescore,
        mut f: F,
    ) -> DomainResult<SupplierAggregate>
    where
        F: FnMut(&mut SupplierAggregate),
    {
        let scorer = &self.scorer;
        self.collections
            .update_collection::<SupplierAggregate, SupplierAggregate, _>(keys::SUPPLIERS, |rows| {
                let supplier = find_mut(rows, supplier_id)
                    .ok_or_else(|| DomainError::not_found("supplier", supplier_id))?;
                f(supplier);
                supplier.total_debt = supplier.total_debt.max(0.0);
                if rescore == Rescore::Derive {
                    supplier.risk_level = scorer.supplier_risk(supplier);
                }
                Ok(supplier.clone())
            })
    }

    /// Fold one sale into the customer's aggregate and record the income.
    pub fn update_customer_on_sale(
        &self,
        customer_id: &EntityId,
        sale: &SaleRecord,
    ) -> DomainResult<CustomerAggregate> {
        let invoices: Vec<SalesInvoice> = self
            .collections
            .get_collection(keys::SALES_INVOICES, Vec::new());
        let stats = customer_stats(&invoices, customer_id);
        let sales_count = stats.count.max(1) as f64;
        let span = match (stats.first_date, stats.last_date) {
            (Some(first), Some(last)) => months_between(first, last),
            _ => 0.0,
        };
        let method = sale.payment_method.unwrap_or(PaymentMethod::Cash);

        let updated = self.modify_customer(customer_id, Rescore::Derive, |c| {
            c.total_purchases += sale.total;
            c.last_purchase_date = Some(sale.date);
            c.loyalty_points += loyalty_points_for(sale.total);
            c.average_order_value = c.total_purchases / sales_count;
            c.purchase_frequency = sales_count / span.max(MIN_MONTH_SPAN);

            let mut row = PaymentRecord::new(sale.date, sale.total, method, PaymentStatus::Paid);
            if let Some(invoice_id) = &sale.invoice_id {
                row = row.with_reference(invoice_id.clone());
            }
            c.payment_history.push(row);
        });

        let customer = match updated {
            Ok(c) => c,
            Err(err) => {
                warn!(customer_id = %customer_id, error = %err, "customer aggregate not updated on sale");
                return Err(err);
            }
        };

        let mut tx = CashTransaction::income(sale.total, categories::SALES, sale.date)
            .with_payment_method(method)
            .with_description(format!("sale to {}", customer.name));
        if let Some(invoice_id) = &sale.invoice_id {
            tx = tx.with_reference(invoice_id.clone());
        }
        self.ledger.record(tx, self.clock.now())?;

        debug!(
            customer_id = %customer_id,
            total_purchases = customer.total_purchases,
            risk = %customer.risk_level,
            "customer aggregate updated on sale"
        );
        Ok(customer)
    }

    /// Fold one purchase into the supplier's aggregate and record the expense.
    pub fn update_supplier_on_purchase(
        &self,
        supplier_id: &EntityId,
        purchase: &PurchaseRecord,
    ) -> DomainResult<SupplierAggregate> {
        let invoices: Vec<PurchaseInvoice> = self
            .collections
            .get_collection(keys::PURCHASE_INVOICES, Vec::new());
        let stats = supplier_stats(&invoices, supplier_id);
        let purchase_count = stats.count.max(1) as f64;
        let span = match (stats.first_date, stats.last_date) {
            (Some(first), Some(last)) => months_between(first, last),
            _ => 0.0,
        };
        let method = purchase.payment_method.unwrap_or(PaymentMethod::Cash);

        let updated = self.modify_supplier(supplier_id, Rescore::Derive, |s| {
            s.total_purchases += purchase.total;
            s.last_purchase_date = Some(purchase.date);
            s.average_order_value = s.total_purchases / purchase_count;
            s.purchase_frequency = purchase_count / span.max(MIN_MONTH_SPAN);

            let mut row =
                PaymentRecord::new(purchase.date, purchase.total, method, PaymentStatus::Paid);
            if let Some(invoice_id) = &purchase.invoice_id {
                row = row.with_reference(invoice_id.clone());
            }
            s.payment_history.push(row);
        });

        let supplier = match updated {
            Ok(s) => s,
            Err(err) => {
                warn!(supplier_id = %supplier_id, error = %err, "supplier aggregate not updated on purchase");
                return Err(err);
            }
        };

        let mut tx = CashTransaction::expense(purchase.total, categories::PURCHASES, purchase.date)
            .with_payment_method(method)
            .with_description(format!("purchase from {}", supplier.name));
        if let Some(invoice_id) = &purchase.invoice_id {
            tx = tx.with_reference(invoice_id.clone());
        }
        self.ledger.record(tx, self.clock.now())?;

        Ok(supplier)
    }

    /// Reduce the customer's debt by an installment payment.
    ///
    /// The ledger row for the payment is written by the installment lifecycle,
    /// not here.
    pub fn update_customer_on_installment_payment(
        &self,
        customer_id: &EntityId,
        payment: &InstallmentPayment,
    ) -> DomainResult<CustomerAggregate> {
        let result = self.modify_customer(customer_id, Rescore::Derive, |c| {
            c.total_debt = (c.total_debt - payment.amount).max(0.0);
            let settled = c.settle_history(
                &payment.installment_id,
                PaymentMethod::Installment,
                payment.amount,
                PaymentStatus::Paid,
            );
            if !settled {
                c.payment_history.push(
                    PaymentRecord::new(
                        payment.date,
                        payment.amount,
                        PaymentMethod::Installment,
                        PaymentStatus::Paid,
                    )
                    .with_reference(payment.installment_id.clone()),
                );
            }
        });

        if let Err(err) = &result {
            warn!(customer_id = %customer_id, error = %err, "customer aggregate not updated on installment payment");
        }
        result
    }

    /// Flip a customer's tracked payment-history row (check/installment) to `status`.
    pub fn settle_customer_payment(
        &self,
        customer_id: &EntityId,
        reference_id: &EntityId,
        method: PaymentMethod,
        amount: f64,
        status: PaymentStatus,
    ) -> DomainResult<CustomerAggregate> {
        self.modify_customer(customer_id, Rescore::Keep, |c| {
            c.settle_history(reference_id, method, amount, status);
        })
    }

    /// Supplier counterpart of [`Self::settle_customer_payment`].
    pub fn settle_supplier_payment(
        &self,
        supplier_id: &EntityId,
        reference_id: &EntityId,
        method: PaymentMethod,
        amount: f64,
        status: PaymentStatus,
    ) -> DomainResult<SupplierAggregate> {
        self.modify_supplier(supplier_id, Rescore::Keep, |s| {
            s.settle_history(reference_id, method, amount, status);
        })
    }
}

/// One loyalty point per full 100 spent.
pub fn loyalty_points_for(total: f64) -> u64 {
    (total / 100.0).floor().max(0.0) as u64
}

fn upsert<T, K>(rows: &mut Vec<T>, item: T, key: K)
where
    K: Fn(&T) -> &EntityId,
{
    match rows.iter().position(|r| key(r) == key(&item)) {
        Some(i) => rows[i] = item,
        None => rows.push(item),
    }
}
