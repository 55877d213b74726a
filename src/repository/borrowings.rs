//! Borrowing ledger: atomic borrow and return transitions
//!
//! Each transition runs as one database transaction that locks exactly the
//! rows it touches (`SELECT ... FOR UPDATE`), checks its precondition under
//! the lock, performs both writes and commits. Returning early on an error
//! drops the transaction, which rolls everything back, so a failed
//! transition never leaves a partial write and never holds a lock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::borrowing::{Borrowing, BorrowingDetails, CreateBorrowing},
};

/// Fine for a late return: whole days past due times the per-day rate.
/// Returns None when the book came back on time.
pub fn late_fine(
    due_date: DateTime<Utc>,
    returned_date: DateTime<Utc>,
    per_day: Decimal,
) -> Option<Decimal> {
    let days_late = (returned_date - due_date).num_days();
    if days_late > 0 {
        Some(Decimal::from(days_late) * per_day)
    } else {
        None
    }
}

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrowing by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Borrow a book: lock its inventory row, verify a copy is available,
    /// insert the borrowing and decrement the count as one atomic unit.
    pub async fn borrow(&self, borrow: &CreateBorrowing) -> AppResult<i32> {
        let mut tx = self.pool.begin().await.map_err(AppError::from_sqlx)?;

        let available: Option<i32> = sqlx::query_scalar(
            "SELECT available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(borrow.book_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from_sqlx)?;

        let available = available.ok_or_else(|| {
            AppError::NotFound(format!("Book with id {} not found", borrow.book_id))
        })?;

        if available <= 0 {
            return Err(AppError::NoCopiesAvailable);
        }

        let borrowing_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO borrowings (user_id, book_id, borrowed_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(borrow.user_id)
        .bind(borrow.book_id)
        .bind(Utc::now())
        .bind(borrow.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from_sqlx)?;

        sqlx::query("UPDATE books SET available_copies = available_copies - 1 WHERE id = $1")
            .bind(borrow.book_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_sqlx)?;

        tx.commit().await.map_err(AppError::from_sqlx)?;

        Ok(borrowing_id)
    }

    /// Return a borrowing: lock its row, verify it is still open, stamp the
    /// return (assigning any late fine) and increment the book's available
    /// count as one atomic unit.
    pub async fn return_borrowing(&self, id: i32, fine_per_day: Decimal) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await.map_err(AppError::from_sqlx)?;

        let row = sqlx::query(
            "SELECT book_id, due_date, returned_date FROM borrowings WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from_sqlx)?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

        let already_returned: Option<DateTime<Utc>> = row.get("returned_date");
        if already_returned.is_some() {
            return Err(AppError::AlreadyReturned);
        }

        let book_id: i32 = row.get("book_id");
        let due_date: DateTime<Utc> = row.get("due_date");

        let now = Utc::now();
        let fine = late_fine(due_date, now, fine_per_day);

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings
            SET returned_date = $1, fine_amount = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(fine)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from_sqlx)?;

        sqlx::query("UPDATE books SET available_copies = available_copies + 1 WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_sqlx)?;

        tx.commit().await.map_err(AppError::from_sqlx)?;

        Ok(borrowing)
    }

    /// Open borrowings for a user, with book details
    pub async fn get_user_borrowings(&self, user_id: i32) -> AppResult<Vec<BorrowingDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT br.id, br.user_id, br.book_id, br.borrowed_date, br.due_date,
                   br.returned_date, br.fine_amount,
                   bk.title AS book_title, bk.author AS book_author
            FROM borrowings br
            JOIN books bk ON br.book_id = bk.id
            WHERE br.user_id = $1 AND br.returned_date IS NULL
            ORDER BY br.due_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();

        let borrowings = rows
            .into_iter()
            .map(|row| {
                let due_date: DateTime<Utc> = row.get("due_date");
                BorrowingDetails {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    book_id: row.get("book_id"),
                    book_title: row.get("book_title"),
                    book_author: row.get("book_author"),
                    borrowed_date: row.get("borrowed_date"),
                    due_date,
                    returned_date: row.get("returned_date"),
                    fine_amount: row.get("fine_amount"),
                    is_overdue: due_date < now,
                }
            })
            .collect();

        Ok(borrowings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn on_time_return_has_no_fine() {
        let due = Utc::now();
        let returned = due - Duration::hours(2);
        assert_eq!(late_fine(due, returned, Decimal::new(50, 2)), None);
    }

    #[test]
    fn return_on_due_day_has_no_fine() {
        let due = Utc::now();
        let returned = due + Duration::hours(23);
        assert_eq!(late_fine(due, returned, Decimal::new(50, 2)), None);
    }

    #[test]
    fn late_return_charges_per_whole_day() {
        let due = Utc::now();
        let returned = due + Duration::days(3);
        assert_eq!(
            late_fine(due, returned, Decimal::new(50, 2)),
            Some(Decimal::new(150, 2))
        );
    }

    #[test]
    fn partial_extra_day_is_not_charged() {
        let due = Utc::now();
        let returned = due + Duration::days(2) + Duration::hours(12);
        assert_eq!(
            late_fine(due, returned, Decimal::new(50, 2)),
            Some(Decimal::new(100, 2))
        );
    }
}
