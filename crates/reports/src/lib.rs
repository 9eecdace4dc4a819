//! Unified, dated business report composed from every other component.
//!
//! Each section is computed independently; a section whose inputs cannot be
//! read degrades to its default and is listed in `degraded_sections`.

pub mod aggregator;
pub mod assessment;
pub mod metric;
pub mod report;
pub mod sections;

pub use aggregator::UnifiedReportAggregator;
pub use assessment::{Opportunity, RiskItem, Severity};
pub use metric::Metric;
pub use report::{
    CashFlowAnalysis, CustomerAnalysis, FinancialSummary, InventoryAnalysis, Kpis, PartyBalance,
    PaymentsAnalysis, Predictions, ReportPeriod, SupplierAnalysis, UnifiedReport,
};
