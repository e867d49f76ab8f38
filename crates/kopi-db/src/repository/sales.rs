//! # Sales Ledger Repository
//!
//! Append-only sale lines plus the aggregate queries reporting needs.
//!
//! Rows are never updated or deleted. Attribution is by the stored name
//! snapshot, not a product foreign key: renaming a product orphans its
//! history, which is accepted observed behavior.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kopi_core::SalesRecord;

const SALES_COLUMNS: &str =
    "id, product_name, category, quantity, unit_price_cents, recorded_at";

/// One row of the revenue-by-product report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRevenue {
    pub product_name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Repository for the append-only sales ledger.
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    /// Creates a new SalesRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    /// Appends one sale line.
    pub async fn append(&self, record: &SalesRecord) -> DbResult<()> {
        debug!(
            product = %record.product_name,
            quantity = record.quantity,
            "Appending sales record"
        );

        sqlx::query(
            r#"
            INSERT INTO sales_records (
                id, product_name, category, quantity, unit_price_cents, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.product_name)
        .bind(&record.category)
        .bind(record.quantity)
        .bind(record.unit_price_cents)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends several lines in one transaction (one order's lines share
    /// a timestamp, so they should land together).
    pub async fn append_all(&self, records: &[SalesRecord]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO sales_records (
                    id, product_name, category, quantity, unit_price_cents, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&record.id)
            .bind(&record.product_name)
            .bind(&record.category)
            .bind(record.quantity)
            .bind(record.unit_price_cents)
            .bind(record.recorded_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Lists records in a half-open time range `[from, to)`, oldest first.
    pub async fn list_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<SalesRecord>> {
        let sql = format!(
            "SELECT {SALES_COLUMNS} FROM sales_records \
             WHERE recorded_at >= ?1 AND recorded_at < ?2 ORDER BY recorded_at"
        );
        let records = sqlx::query_as::<_, SalesRecord>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Total units moved in a range, synthetic ingredient rows included.
    pub async fn sum_quantity(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM sales_records \
             WHERE recorded_at >= ?1 AND recorded_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Revenue in a range. Synthetic rows carry a zero price, so they
    /// contribute nothing here without needing a filter.
    pub async fn sum_revenue_cents(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity * unit_price_cents), 0) FROM sales_records \
             WHERE recorded_at >= ?1 AND recorded_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Top N products by revenue in a range, grouped by name snapshot.
    /// Synthetic rows are excluded: flour is not a bestseller.
    pub async fn top_products_by_revenue(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<ProductRevenue>> {
        let rows = sqlx::query_as::<_, ProductRevenue>(
            r#"
            SELECT
                product_name,
                SUM(quantity) AS units_sold,
                SUM(quantity * unit_price_cents) AS revenue_cents
            FROM sales_records
            WHERE recorded_at >= ?1 AND recorded_at < ?2 AND unit_price_cents > 0
            GROUP BY product_name
            ORDER BY revenue_cents DESC
            LIMIT ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Generates a new sales record id.
pub fn generate_sales_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use kopi_core::types::{CATEGORY_BEVERAGES, CATEGORY_INGREDIENTS};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn record(name: &str, category: &str, qty: i64, price: i64, at: DateTime<Utc>) -> SalesRecord {
        SalesRecord {
            id: generate_sales_record_id(),
            product_name: name.to_string(),
            category: category.to_string(),
            quantity: qty,
            unit_price_cents: price,
            recorded_at: at,
        }
    }

    #[tokio::test]
    async fn test_append_and_range_query() {
        let db = test_db().await;
        let repo = db.sales();
        let now = Utc::now();

        repo.append(&record("Latte", CATEGORY_BEVERAGES, 2, 12000, now))
            .await
            .unwrap();
        repo.append(&record(
            "Espresso",
            CATEGORY_BEVERAGES,
            1,
            9000,
            now - Duration::days(2),
        ))
        .await
        .unwrap();

        let today = repo
            .list_range(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].product_name, "Latte");
    }

    #[tokio::test]
    async fn test_revenue_ignores_synthetic_rows() {
        let db = test_db().await;
        let repo = db.sales();
        let now = Utc::now();

        let lines = vec![
            record("Latte", CATEGORY_BEVERAGES, 2, 12000, now),
            // Synthetic ingredient deduction: price 0
            record("Milk", CATEGORY_INGREDIENTS, 300, 0, now),
        ];
        repo.append_all(&lines).await.unwrap();

        let from = now - Duration::hours(1);
        let to = now + Duration::hours(1);

        assert_eq!(repo.sum_revenue_cents(from, to).await.unwrap(), 24000);
        // Quantity sum does include ingredient movement
        assert_eq!(repo.sum_quantity(from, to).await.unwrap(), 302);
    }

    #[tokio::test]
    async fn test_top_products_grouped_by_name() {
        let db = test_db().await;
        let repo = db.sales();
        let now = Utc::now();

        repo.append_all(&[
            record("Latte", CATEGORY_BEVERAGES, 2, 12000, now),
            record("Latte", CATEGORY_BEVERAGES, 1, 12000, now),
            record("Espresso", CATEGORY_BEVERAGES, 5, 9000, now),
            record("Milk", CATEGORY_INGREDIENTS, 500, 0, now),
        ])
        .await
        .unwrap();

        let top = repo
            .top_products_by_revenue(now - Duration::hours(1), now + Duration::hours(1), 10)
            .await
            .unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_name, "Espresso");
        assert_eq!(top[0].revenue_cents, 45000);
        assert_eq!(top[1].product_name, "Latte");
        assert_eq!(top[1].units_sold, 3);
    }
}
