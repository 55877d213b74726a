//! Borrowing endpoints
//!
//! Both transitions require an authenticated caller. The recorded borrower
//! is always the verified identity from the token; only administrators may
//! borrow on behalf of another user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrowing::{Borrowing, BorrowingDetails},
};

use super::AuthenticatedUser;

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Book to borrow
    pub book_id: i32,
    /// When the book is due back
    pub due_date: DateTime<Utc>,
    /// Borrow on behalf of this user (administrators only)
    pub user_id: Option<i32>,
}

/// Borrow response
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    /// Created borrowing ID
    pub borrowing_id: i32,
    /// Due date of the new borrowing
    pub due_date: DateTime<Utc>,
    /// Status message
    pub message: String,
}

/// Return response with the closed borrowing
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// The closed borrowing, including any late fine
    pub borrowing: Borrowing,
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "No copies available")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let user_id = match request.user_id {
        Some(id) if id != claims.user_id => {
            claims.require_admin()?;
            id
        }
        _ => claims.user_id,
    };

    let borrowing_id = state
        .services
        .borrowings
        .borrow(user_id, request.book_id, request.due_date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            borrowing_id,
            due_date: request.due_date,
            message: "Book borrowed successfully".to_string(),
        }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(borrowing_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let borrowing = state.services.borrowings.return_borrowing(borrowing_id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        borrowing,
    }))
}

/// Get open borrowings for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's open borrowings", body = Vec<BorrowingDetails>),
        (status = 403, description = "Not allowed to read other users' borrowings"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    if user_id != claims.user_id {
        claims.require_admin()?;
    }

    let borrowings = state.services.borrowings.get_user_borrowings(user_id).await?;
    Ok(Json(borrowings))
}
