//! Reporting service: read-only aggregate queries
//!
//! Each report is a single SELECT with no transactional requirements.
//! Responses are cached in Redis for a short TTL; the cache is
//! invalidated by the borrowing service after every committed borrow or
//! return.

use sqlx::Row;

use crate::{
    api::reports::{OverdueBook, PopularBook, RevenueEntry, UserStatistics},
    config::LibraryConfig,
    error::AppResult,
    repository::Repository,
    services::redis::RedisService,
};

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
    library: LibraryConfig,
    redis: RedisService,
}

impl ReportsService {
    pub fn new(repository: Repository, library: LibraryConfig, redis: RedisService) -> Self {
        Self {
            repository,
            library,
            redis,
        }
    }

    /// Open borrowings past their due date
    pub async fn overdue_books(&self) -> AppResult<Vec<OverdueBook>> {
        const KEY: &str = "cache:reports:overdue";
        if let Ok(Some(cached)) = self.redis.get_json::<Vec<OverdueBook>>(KEY).await {
            return Ok(cached);
        }

        let rows = sqlx::query(
            r#"
            SELECT
                br.id AS borrowing_id,
                u.id AS user_id,
                u.name AS user_name,
                u.email AS user_email,
                bk.id AS book_id,
                bk.title AS book_title,
                br.borrowed_date,
                br.due_date
            FROM borrowings br
            JOIN users u ON br.user_id = u.id
            JOIN books bk ON br.book_id = bk.id
            WHERE br.returned_date IS NULL
              AND br.due_date < NOW()
            ORDER BY br.due_date ASC
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        let result: Vec<OverdueBook> = rows
            .into_iter()
            .map(|row| OverdueBook {
                borrowing_id: row.get("borrowing_id"),
                user_id: row.get("user_id"),
                user_name: row.get("user_name"),
                user_email: row.get("user_email"),
                book_id: row.get("book_id"),
                book_title: row.get("book_title"),
                borrowed_date: row.get("borrowed_date"),
                due_date: row.get("due_date"),
            })
            .collect();

        self.cache(KEY, &result).await;
        Ok(result)
    }

    /// Most-borrowed books over the last six months
    pub async fn popular_books(&self, limit: i64) -> AppResult<Vec<PopularBook>> {
        let key = format!("cache:reports:popular:{}", limit);
        if let Ok(Some(cached)) = self.redis.get_json::<Vec<PopularBook>>(&key).await {
            return Ok(cached);
        }

        let rows = sqlx::query(
            r#"
            SELECT
                bk.id AS book_id,
                bk.title AS book_title,
                bk.author AS book_author,
                COUNT(br.id) AS borrow_count
            FROM borrowings br
            JOIN books bk ON br.book_id = bk.id
            WHERE br.borrowed_date >= NOW() - INTERVAL '6 months'
            GROUP BY bk.id, bk.title, bk.author
            ORDER BY borrow_count DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.repository.pool)
        .await?;

        let result: Vec<PopularBook> = rows
            .into_iter()
            .map(|row| PopularBook {
                book_id: row.get("book_id"),
                book_title: row.get("book_title"),
                book_author: row.get("book_author"),
                borrow_count: row.get("borrow_count"),
            })
            .collect();

        self.cache(&key, &result).await;
        Ok(result)
    }

    /// Per-user borrowing totals for active users
    pub async fn user_statistics(&self) -> AppResult<Vec<UserStatistics>> {
        const KEY: &str = "cache:reports:user-statistics";
        if let Ok(Some(cached)) = self.redis.get_json::<Vec<UserStatistics>>(KEY).await {
            return Ok(cached);
        }

        let rows = sqlx::query(
            r#"
            SELECT
                u.id AS user_id,
                u.name AS user_name,
                u.email AS user_email,
                COUNT(br.id) AS total_borrowed,
                COALESCE(SUM(CASE WHEN br.returned_date IS NULL THEN 1 ELSE 0 END), 0) AS outstanding_books
            FROM users u
            LEFT JOIN borrowings br ON br.user_id = u.id
            WHERE u.is_active = TRUE
            GROUP BY u.id, u.name, u.email
            ORDER BY u.name
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        let result: Vec<UserStatistics> = rows
            .into_iter()
            .map(|row| UserStatistics {
                user_id: row.get("user_id"),
                user_name: row.get("user_name"),
                user_email: row.get("user_email"),
                total_borrowed: row.get("total_borrowed"),
                outstanding_books: row.get("outstanding_books"),
            })
            .collect();

        self.cache(KEY, &result).await;
        Ok(result)
    }

    /// Fines collected per month of the current year
    pub async fn revenue(&self) -> AppResult<Vec<RevenueEntry>> {
        const KEY: &str = "cache:reports:revenue";
        if let Ok(Some(cached)) = self.redis.get_json::<Vec<RevenueEntry>>(KEY).await {
            return Ok(cached);
        }

        let rows = sqlx::query(
            r#"
            SELECT
                EXTRACT(MONTH FROM br.returned_date)::int AS month,
                EXTRACT(YEAR FROM br.returned_date)::int AS year,
                COALESCE(SUM(br.fine_amount), 0) AS total_fines
            FROM borrowings br
            WHERE br.returned_date IS NOT NULL
              AND EXTRACT(YEAR FROM br.returned_date) = EXTRACT(YEAR FROM CURRENT_DATE)
            GROUP BY EXTRACT(YEAR FROM br.returned_date), EXTRACT(MONTH FROM br.returned_date)
            ORDER BY month
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        let result: Vec<RevenueEntry> = rows
            .into_iter()
            .map(|row| RevenueEntry {
                month: row.get("month"),
                year: row.get("year"),
                total_fines: row.get("total_fines"),
            })
            .collect();

        self.cache(KEY, &result).await;
        Ok(result)
    }

    async fn cache<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self
            .redis
            .set_json(key, value, self.library.cache_ttl_seconds)
            .await
        {
            tracing::warn!("Failed to cache report {}: {}", key, e);
        }
    }
}
