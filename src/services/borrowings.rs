//! Borrowing service: the ledger facade used by the API layer

use chrono::{DateTime, Utc};

use crate::{
    config::LibraryConfig,
    error::{AppError, AppResult},
    models::borrowing::{Borrowing, BorrowingDetails, CreateBorrowing},
    repository::Repository,
    services::redis::RedisService,
};

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
    library: LibraryConfig,
    redis: RedisService,
}

impl BorrowingsService {
    pub fn new(repository: Repository, library: LibraryConfig, redis: RedisService) -> Self {
        Self {
            repository,
            library,
            redis,
        }
    }

    /// Borrow a book for a user
    pub async fn borrow(
        &self,
        user_id: i32,
        book_id: i32,
        due_date: DateTime<Utc>,
    ) -> AppResult<i32> {
        if due_date <= Utc::now() {
            return Err(AppError::Validation(
                "Due date must be in the future".to_string(),
            ));
        }

        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;

        let borrowing_id = self
            .repository
            .borrowings
            .borrow(&CreateBorrowing {
                user_id,
                book_id,
                due_date,
            })
            .await?;

        self.invalidate_report_cache().await;

        Ok(borrowing_id)
    }

    /// Return a borrowed book
    pub async fn return_borrowing(&self, borrowing_id: i32) -> AppResult<Borrowing> {
        let borrowing = self
            .repository
            .borrowings
            .return_borrowing(borrowing_id, self.library.fine_per_day)
            .await?;

        self.invalidate_report_cache().await;

        Ok(borrowing)
    }

    /// Open borrowings for a user
    pub async fn get_user_borrowings(&self, user_id: i32) -> AppResult<Vec<BorrowingDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.borrowings.get_user_borrowings(user_id).await
    }

    /// Cached reports are stale after any committed borrow or return.
    /// A cache failure only delays freshness until the TTL expires, so it
    /// is logged rather than turned into a failure of the committed
    /// transition.
    async fn invalidate_report_cache(&self) {
        if let Err(e) = self.redis.invalidate("cache:reports:*").await {
            tracing::error!("Failed to invalidate report cache: {}", e);
        }
    }
}
