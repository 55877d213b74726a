//! OpenAPI documentation

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, borrowings, health, reports, tasks};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Liber API",
        version = "1.0.0",
        description = "Library Management and Task Tracking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::refresh,
        auth::me,
        // Tasks
        tasks::list_tasks,
        tasks::get_task,
        tasks::create_task,
        tasks::update_task,
        tasks::delete_task,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrowings
        borrowings::borrow,
        borrowings::return_borrowing,
        borrowings::get_user_borrowings,
        // Reports
        reports::overdue_books,
        reports::popular_books,
        reports::user_statistics,
        reports::revenue,
    ),
    components(
        schemas(
            // Health
            health::HealthResponse,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RefreshRequest,
            auth::RefreshResponse,
            auth::UserInfo,
            crate::models::user::RegisterUser,
            crate::models::user::Role,
            // Tasks
            crate::models::task::Task,
            crate::models::task::TaskInput,
            crate::models::task::TaskStatus,
            crate::models::task::TaskPriority,
            crate::models::task::TaskSort,
            tasks::TaskListResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::BookListResponse,
            // Borrowings
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowingDetails,
            borrowings::BorrowRequest,
            borrowings::BorrowResponse,
            borrowings::ReturnResponse,
            // Reports
            reports::OverdueBook,
            reports::PopularBook,
            reports::UserStatistics,
            reports::RevenueEntry,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Authentication"),
        (name = "tasks", description = "Task tracking"),
        (name = "books", description = "Book catalog"),
        (name = "borrowings", description = "Borrow and return"),
        (name = "reports", description = "Read-only reports"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Router serving the Swagger UI and the raw OpenAPI document
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
