use serde::{Deserialize, Serialize};

use bizpulse_core::EntityId;
use bizpulse_payments::{NewCheck, NewInstallment};
use bizpulse_purchasing::PurchaseInvoice;
use bizpulse_sales::SalesInvoice;

use crate::Event;

/// Everything that changes stored aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusinessEvent {
    SaleRecorded(SalesInvoice),
    PurchaseRecorded(PurchaseInvoice),
    CheckReceived(NewCheck),
    #[serde(rename_all = "camelCase")]
    CheckCashed { check_id: EntityId },
    #[serde(rename_all = "camelCase")]
    CheckReturned { check_id: EntityId, reason: String },
    #[serde(rename_all = "camelCase")]
    CheckCancelled { check_id: EntityId },
    InstallmentScheduled(NewInstallment),
    #[serde(rename_all = "camelCase")]
    InstallmentPaid { installment_id: EntityId },
    #[serde(rename_all = "camelCase")]
    InstallmentDefaulted { installment_id: EntityId },
}

impl Event for BusinessEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BusinessEvent::SaleRecorded(_) => "sale.recorded",
            BusinessEvent::PurchaseRecorded(_) => "purchase.recorded",
            BusinessEvent::CheckReceived(_) => "check.received",
            BusinessEvent::CheckCashed { .. } => "check.cashed",
            BusinessEvent::CheckReturned { .. } => "check.returned",
            BusinessEvent::CheckCancelled { .. } => "check.cancelled",
            BusinessEvent::InstallmentScheduled(_) => "installment.scheduled",
            BusinessEvent::InstallmentPaid { .. } => "installment.paid",
            BusinessEvent::InstallmentDefaulted { .. } => "installment.defaulted",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn tagged_wire_format() {
        let ev = BusinessEvent::CheckReturned {
            check_id: EntityId::new("1001"),
            reason: "insufficient funds".into(),
        };
        let value = serde_json::to_value(&ev).unwrap();
        assert_eq!(
            value,
            json!({"type": "check_returned", "checkId": "1001", "reason": "insufficient funds"})
        );
        assert_eq!(ev.event_type(), "check.returned");
    }

    #[test]
    fn sale_payload_is_inlined() {
        let value = json!({
            "type": "sale_recorded",
            "id": "inv-1",
            "customerId": "c1",
            "customerName": "Acme",
            "date": "2024-03-01",
            "items": [],
            "total": 250.0
        });
        let ev: BusinessEvent = serde_json::from_value(value).unwrap();
        match ev {
            BusinessEvent::SaleRecorded(inv) => {
                assert_eq!(inv.total, 250.0);
                assert_eq!(inv.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
            }
            other => panic!("Expected SaleRecorded, got {other:?}"),
        }
    }
}
