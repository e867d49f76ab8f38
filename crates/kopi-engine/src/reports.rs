//! # Reports
//!
//! Read-only aggregation over the sales and waste ledgers.
//!
//! Revenue figures are immune to synthetic ingredient rows (their unit
//! price is zero), while quantity figures deliberately include them:
//! that is how ingredient consumption shows up in movement reports.
//! Best-seller rankings exclude synthetic rows entirely.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kopi_db::{Database, ProductRevenue};

use crate::error::EngineResult;

/// Aggregated sales figures for a reporting window `[from, to)`.
#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub revenue_cents: i64,
    pub units_moved: i64,
}

/// Aggregated shrinkage for a reporting window `[from, to)`.
#[derive(Debug, Clone, Serialize)]
pub struct WasteSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_cost_cents: i64,
    pub record_count: usize,
}

/// Read-only reporting over the ledgers.
#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    /// Creates a new ReportService.
    pub fn new(db: Database) -> Self {
        ReportService { db }
    }

    /// Revenue and units moved in `[from, to)`.
    pub async fn sales_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<SalesSummary> {
        let sales = self.db.sales();

        Ok(SalesSummary {
            from,
            to,
            revenue_cents: sales.sum_revenue_cents(from, to).await?,
            units_moved: sales.sum_quantity(from, to).await?,
        })
    }

    /// Best sellers by revenue in `[from, to)`.
    pub async fn top_products(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> EngineResult<Vec<ProductRevenue>> {
        Ok(self
            .db
            .sales()
            .top_products_by_revenue(from, to, limit)
            .await?)
    }

    /// Shrinkage valuation in `[from, to)`, at frozen per-unit costs.
    pub async fn waste_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<WasteSummary> {
        let waste = self.db.waste();

        Ok(WasteSummary {
            from,
            to,
            total_cost_cents: waste.total_waste_cost_cents(from, to).await?,
            record_count: waste.list_range(from, to).await?.len(),
        })
    }
}
