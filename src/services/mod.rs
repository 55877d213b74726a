//! Business logic services

pub mod books;
pub mod borrowings;
pub mod redis;
pub mod reports;
pub mod tasks;
pub mod users;

use crate::{
    config::{AuthConfig, LibraryConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub borrowings: borrowings::BorrowingsService,
    pub reports: reports::ReportsService,
    pub tasks: tasks::TasksService,
    pub users: users::UsersService,
    pub redis: redis::RedisService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        library_config: LibraryConfig,
        redis_service: redis::RedisService,
    ) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            borrowings: borrowings::BorrowingsService::new(
                repository.clone(),
                library_config.clone(),
                redis_service.clone(),
            ),
            reports: reports::ReportsService::new(
                repository.clone(),
                library_config.clone(),
                redis_service.clone(),
            ),
            tasks: tasks::TasksService::new(
                repository.clone(),
                library_config,
                redis_service.clone(),
            ),
            users: users::UsersService::new(repository, auth_config),
            redis: redis_service,
        }
    }
}
