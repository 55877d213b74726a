//! Reporting endpoints (read-only aggregates)

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;

use super::AuthenticatedUser;

/// Overdue borrowing with user and book details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OverdueBook {
    pub borrowing_id: i32,
    pub user_id: i32,
    pub user_name: Option<String>,
    pub user_email: String,
    pub book_id: i32,
    pub book_title: String,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Borrow-count ranking entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PopularBook {
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub borrow_count: i64,
}

/// Per-user borrowing totals
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserStatistics {
    pub user_id: i32,
    pub user_name: Option<String>,
    pub user_email: String,
    pub total_borrowed: i64,
    pub outstanding_books: i64,
}

/// Monthly fine revenue
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevenueEntry {
    pub month: i32,
    pub year: i32,
    #[schema(value_type = f64)]
    pub total_fines: Decimal,
}

/// Query parameters for the popularity ranking
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PopularQuery {
    /// Maximum number of books to return (default 5)
    pub limit: Option<i64>,
}

/// Overdue borrowings
#[utoipa::path(
    get,
    path = "/reports/overdue",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue borrowings", body = Vec<OverdueBook>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn overdue_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<OverdueBook>>> {
    let report = state.services.reports.overdue_books().await?;
    Ok(Json(report))
}

/// Most-borrowed books over the last six months
#[utoipa::path(
    get,
    path = "/reports/popular",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(PopularQuery),
    responses(
        (status = 200, description = "Popularity ranking", body = Vec<PopularBook>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn popular_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PopularQuery>,
) -> AppResult<Json<Vec<PopularBook>>> {
    let limit = query.limit.unwrap_or(5).clamp(1, 100);
    let report = state.services.reports.popular_books(limit).await?;
    Ok(Json(report))
}

/// Per-user borrowing statistics
#[utoipa::path(
    get,
    path = "/reports/user-statistics",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User statistics", body = Vec<UserStatistics>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn user_statistics(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserStatistics>>> {
    let report = state.services.reports.user_statistics().await?;
    Ok(Json(report))
}

/// Fine revenue per month of the current year
#[utoipa::path(
    get,
    path = "/reports/revenue",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Monthly fine revenue", body = Vec<RevenueEntry>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn revenue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RevenueEntry>>> {
    let report = state.services.reports.revenue().await?;
    Ok(Json(report))
}
