//! Borrowing model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Borrowing record from database.
///
/// A borrowing is open while `returned_date` is NULL; it transitions to the
/// returned state exactly once and is never reopened or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    #[schema(value_type = Option<f64>)]
    pub fine_amount: Option<Decimal>,
}

/// Borrowing with book details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    #[schema(value_type = Option<f64>)]
    pub fine_amount: Option<Decimal>,
    pub is_overdue: bool,
}

/// Internal borrow command assembled by the service layer
#[derive(Debug, Clone)]
pub struct CreateBorrowing {
    pub user_id: i32,
    pub book_id: i32,
    pub due_date: DateTime<Utc>,
}
