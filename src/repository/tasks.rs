//! Tasks repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::task::{Task, TaskInput, TaskQuery, TaskSort},
};

#[derive(Clone)]
pub struct TasksRepository {
    pool: Pool<Postgres>,
}

impl TasksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get task by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Task> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task with id {} not found", id)))
    }

    /// Search tasks with filters, sorting and pagination. When `owner_id`
    /// is set the listing is restricted to that owner's tasks.
    pub async fn search(
        &self,
        query: &TaskQuery,
        owner_id: Option<i32>,
    ) -> AppResult<(Vec<Task>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut conditions: Vec<String> = Vec::new();
        let mut param = 0;
        if owner_id.is_some() {
            param += 1;
            conditions.push(format!("owner_id = ${}", param));
        }
        if query.status.is_some() {
            param += 1;
            conditions.push(format!("status = ${}", param));
        }
        if query.priority.is_some() {
            param += 1;
            conditions.push(format!("priority = ${}", param));
        }
        if query.search.is_some() {
            param += 1;
            conditions.push(format!("(title ILIKE ${0} OR description ILIKE ${0})", param));
        }

        let where_clause = if conditions.is_empty() {
            "TRUE".to_string()
        } else {
            conditions.join(" AND ")
        };

        let order_by = match query.sort {
            Some(TaskSort::DateCreated) => "created_at, id",
            Some(TaskSort::DueDate) => "due_date ASC NULLS LAST, id",
            None => "id",
        };

        let sql = format!(
            "SELECT * FROM tasks WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            where_clause,
            order_by,
            param + 1,
            param + 2
        );

        let mut q = sqlx::query_as::<_, Task>(&sql);
        if let Some(owner) = owner_id {
            q = q.bind(owner);
        }
        if let Some(status) = query.status {
            q = q.bind(status);
        }
        if let Some(priority) = query.priority {
            q = q.bind(priority);
        }
        if let Some(ref search) = query.search {
            q = q.bind(format!("%{}%", search));
        }
        let tasks = q.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        let count_sql = format!("SELECT COUNT(*) FROM tasks WHERE {}", where_clause);
        let mut c = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(owner) = owner_id {
            c = c.bind(owner);
        }
        if let Some(status) = query.status {
            c = c.bind(status);
        }
        if let Some(priority) = query.priority {
            c = c.bind(priority);
        }
        if let Some(ref search) = query.search {
            c = c.bind(format!("%{}%", search));
        }
        let total = c.fetch_one(&self.pool).await?;

        Ok((tasks, total))
    }

    /// Create a new task owned by `owner_id`
    pub async fn create(&self, task: &TaskInput, owner_id: i32) -> AppResult<Task> {
        let created = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Replace a task's mutable fields
    pub async fn update(&self, id: i32, task: &TaskInput) -> AppResult<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $1, description = $2, status = $3, priority = $4,
                due_date = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task with id {} not found", id)))
    }

    /// Delete a task
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Task with id {} not found", id)));
        }

        Ok(())
    }
}
