//! Task management service
//!
//! Owns the role-scoping rules: the `user` role only ever sees and edits
//! its own tasks, `admin` sees everything, `guest` is read-only.

use serde::{Deserialize, Serialize};

use crate::{
    config::LibraryConfig,
    error::{AppError, AppResult},
    models::{
        task::{Task, TaskInput, TaskQuery, TaskSort},
        user::{Role, UserClaims},
    },
    repository::Repository,
    services::redis::RedisService,
};

#[derive(Serialize, Deserialize)]
struct CachedListing {
    tasks: Vec<Task>,
    total: i64,
}

#[derive(Clone)]
pub struct TasksService {
    repository: Repository,
    library: LibraryConfig,
    redis: RedisService,
}

impl TasksService {
    pub fn new(repository: Repository, library: LibraryConfig, redis: RedisService) -> Self {
        Self {
            repository,
            library,
            redis,
        }
    }

    /// List tasks visible to the caller
    pub async fn list(
        &self,
        claims: &UserClaims,
        query: &TaskQuery,
    ) -> AppResult<(Vec<Task>, i64)> {
        let owner = self.owner_scope(claims);
        let key = listing_cache_key(query, owner);

        if let Ok(Some(cached)) = self.redis.get_json::<CachedListing>(&key).await {
            return Ok((cached.tasks, cached.total));
        }

        let (tasks, total) = self.repository.tasks.search(query, owner).await?;

        let entry = CachedListing {
            tasks: tasks.clone(),
            total,
        };
        if let Err(e) = self
            .redis
            .set_json(&key, &entry, self.library.cache_ttl_seconds)
            .await
        {
            tracing::warn!("Failed to cache task listing: {}", e);
        }

        Ok((tasks, total))
    }

    /// Get a task visible to the caller
    pub async fn get(&self, claims: &UserClaims, id: i32) -> AppResult<Task> {
        let task = self.repository.tasks.get_by_id(id).await?;
        self.check_visible(claims, &task)?;
        Ok(task)
    }

    /// Create a task owned by the caller
    pub async fn create(&self, claims: &UserClaims, input: TaskInput) -> AppResult<Task> {
        claims.require_write_tasks()?;

        let task = self.repository.tasks.create(&input, claims.user_id).await?;
        self.invalidate_task_cache().await;
        Ok(task)
    }

    /// Update a task the caller may edit
    pub async fn update(&self, claims: &UserClaims, id: i32, input: TaskInput) -> AppResult<Task> {
        claims.require_write_tasks()?;

        let existing = self.repository.tasks.get_by_id(id).await?;
        self.check_visible(claims, &existing)?;

        let task = self.repository.tasks.update(id, &input).await?;
        self.invalidate_task_cache().await;
        Ok(task)
    }

    /// Delete a task the caller may edit
    pub async fn delete(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require_write_tasks()?;

        let existing = self.repository.tasks.get_by_id(id).await?;
        self.check_visible(claims, &existing)?;

        self.repository.tasks.delete(id).await?;
        self.invalidate_task_cache().await;
        Ok(())
    }

    fn owner_scope(&self, claims: &UserClaims) -> Option<i32> {
        match claims.role {
            Role::User => Some(claims.user_id),
            Role::Admin | Role::Guest => None,
        }
    }

    /// A task outside the caller's scope reads as absent, not forbidden
    fn check_visible(&self, claims: &UserClaims, task: &Task) -> AppResult<()> {
        if claims.role == Role::User && task.owner_id != claims.user_id {
            return Err(AppError::NotFound(format!(
                "Task with id {} not found",
                task.id
            )));
        }
        Ok(())
    }

    async fn invalidate_task_cache(&self) {
        if let Err(e) = self.redis.invalidate("cache:tasks:*").await {
            tracing::error!("Failed to invalidate task cache: {}", e);
        }
    }
}

fn listing_cache_key(query: &TaskQuery, owner: Option<i32>) -> String {
    let owner = owner.map(|id| id.to_string()).unwrap_or_else(|| "all".into());
    let status = query.status.map(|s| s.as_str()).unwrap_or("none");
    let priority = query.priority.map(|p| p.as_str()).unwrap_or("none");
    let sort = match query.sort {
        Some(TaskSort::DateCreated) => "date_created",
        Some(TaskSort::DueDate) => "due_date",
        None => "none",
    };
    format!(
        "cache:tasks:{}:{}:{}:{}:{}:{}:{}",
        owner,
        status,
        priority,
        sort,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
        query.search.as_deref().unwrap_or("none"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> TaskQuery {
        TaskQuery {
            status: None,
            priority: None,
            sort: Some(TaskSort::DueDate),
            search: None,
            page: Some(2),
            limit: Some(25),
        }
    }

    #[test]
    fn cache_key_separates_owner_scopes() {
        let q = query();
        let scoped = listing_cache_key(&q, Some(7));
        let global = listing_cache_key(&q, None);
        assert_ne!(scoped, global);
        assert!(scoped.starts_with("cache:tasks:7:"));
    }

    #[test]
    fn cache_key_includes_pagination_and_sort() {
        let key = listing_cache_key(&query(), None);
        assert_eq!(key, "cache:tasks:all:none:none:due_date:2:25:none");
    }
}
