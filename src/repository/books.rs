//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let pattern = query.search.as_ref().map(|s| format!("%{}%", s));

        let (books, total) = if let Some(ref pattern) = pattern {
            let books = sqlx::query_as::<_, Book>(
                r#"
                SELECT * FROM books
                WHERE title ILIKE $1 OR author ILIKE $1
                ORDER BY title, id
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

            let total: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM books WHERE title ILIKE $1 OR author ILIKE $1",
            )
            .bind(pattern)
            .fetch_one(&self.pool)
            .await?;

            (books, total)
        } else {
            let books = sqlx::query_as::<_, Book>(
                "SELECT * FROM books ORDER BY title, id LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
                .fetch_one(&self.pool)
                .await?;

            (books, total)
        };

        Ok((books, total))
    }

    /// Create a new book; all copies start available
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, total_copies, available_copies)
            VALUES ($1, $2, $3, $3)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a book. Changing `total_copies` shifts `available_copies` by
    /// the same delta under the row lock, so the count of open borrowings
    /// stays consistent; shrinking below the outstanding count is rejected.
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await.map_err(AppError::from_sqlx)?;

        let current = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::from_sqlx)?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let title = update.title.clone().unwrap_or(current.title);
        let author = update.author.clone().unwrap_or(current.author);
        let total_copies = update.total_copies.unwrap_or(current.total_copies);

        let available_copies = current.available_copies + (total_copies - current.total_copies);
        if available_copies < 0 {
            return Err(AppError::Conflict(
                "Cannot reduce total copies below the number of outstanding borrowings"
                    .to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, total_copies = $3, available_copies = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&title)
        .bind(&author)
        .bind(total_copies)
        .bind(available_copies)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from_sqlx)?;

        tx.commit().await.map_err(AppError::from_sqlx)?;

        Ok(updated)
    }

    /// Delete a book. Refused while any borrowing is still open; the
    /// borrowing ledger itself never deletes books.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::from_sqlx)?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::from_sqlx)?;

        if exists.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        // Borrowing records are never deleted, so a book with any history
        // (open or closed) stays in the catalog.
        let referenced: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE book_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from_sqlx)?;

        if referenced > 0 {
            return Err(AppError::Conflict(
                "Book has borrowing records".to_string(),
            ));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_sqlx)?;

        tx.commit().await.map_err(AppError::from_sqlx)?;

        Ok(())
    }
}
