//! Borrowing ledger property tests
//!
//! These run against a live PostgreSQL instance and are ignored by
//! default. Run with:
//!   DATABASE_URL=postgres://... cargo test -- --ignored

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use liber_server::error::AppError;
use liber_server::models::borrowing::CreateBorrowing;
use liber_server::repository::Repository;

static SEED_COUNTER: AtomicU32 = AtomicU32::new(0);

async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Repository::new(pool)
}

async fn seed_user(pool: &Pool<Postgres>) -> i32 {
    let email = format!(
        "ledger-test-{}-{}@example.com",
        std::process::id(),
        SEED_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    sqlx::query_scalar(
        "INSERT INTO users (email, password, role) VALUES ($1, 'x', 'user') RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("Failed to seed user")
}

async fn seed_book(pool: &Pool<Postgres>, copies: i32) -> i32 {
    sqlx::query_scalar(
        r#"
        INSERT INTO books (title, author, total_copies, available_copies)
        VALUES ('Test Book', 'Test Author', $1, $1)
        RETURNING id
        "#,
    )
    .bind(copies)
    .fetch_one(pool)
    .await
    .expect("Failed to seed book")
}

async fn available_copies(pool: &Pool<Postgres>, book_id: i32) -> i32 {
    sqlx::query_scalar("SELECT available_copies FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read available copies")
}

async fn total_copies(pool: &Pool<Postgres>, book_id: i32) -> i32 {
    sqlx::query_scalar("SELECT total_copies FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read total copies")
}

async fn open_borrowings(pool: &Pool<Postgres>, book_id: i32) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrowings WHERE book_id = $1 AND returned_date IS NULL",
    )
    .bind(book_id)
    .fetch_one(pool)
    .await
    .expect("Failed to count open borrowings")
}

/// available_copies == total_copies - open borrowings, always
async fn assert_conserved(pool: &Pool<Postgres>, book_id: i32) {
    let available = available_copies(pool, book_id).await;
    let total = total_copies(pool, book_id).await;
    let open = open_borrowings(pool, book_id).await;
    assert_eq!(
        available as i64,
        total as i64 - open,
        "inventory conservation violated for book {}",
        book_id
    );
}

fn borrow_cmd(user_id: i32, book_id: i32) -> CreateBorrowing {
    CreateBorrowing {
        user_id,
        book_id,
        due_date: Utc::now() + Duration::days(14),
    }
}

const FINE_PER_DAY: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn borrowing_last_copy_exhausts_the_book() {
    let repo = repository().await;
    let user_a = seed_user(&repo.pool).await;
    let user_b = seed_user(&repo.pool).await;
    let book = seed_book(&repo.pool, 1).await;

    let borrowing_id = repo
        .borrowings
        .borrow(&borrow_cmd(user_a, book))
        .await
        .expect("First borrow should succeed");
    assert!(borrowing_id > 0);
    assert_eq!(available_copies(&repo.pool, book).await, 0);
    assert_conserved(&repo.pool, book).await;

    let err = repo
        .borrowings
        .borrow(&borrow_cmd(user_b, book))
        .await
        .expect_err("Second borrow must fail");
    assert!(matches!(err, AppError::NoCopiesAvailable));
    assert_eq!(available_copies(&repo.pool, book).await, 0);
    assert_conserved(&repo.pool, book).await;
}

#[tokio::test]
#[ignore]
async fn double_return_fails_and_increments_once() {
    let repo = repository().await;
    let user = seed_user(&repo.pool).await;
    let book = seed_book(&repo.pool, 2).await;

    let borrowing_id = repo
        .borrowings
        .borrow(&borrow_cmd(user, book))
        .await
        .expect("Borrow should succeed");
    assert_eq!(available_copies(&repo.pool, book).await, 1);

    let returned = repo
        .borrowings
        .return_borrowing(borrowing_id, FINE_PER_DAY)
        .await
        .expect("First return should succeed");
    assert!(returned.returned_date.is_some());
    assert_eq!(available_copies(&repo.pool, book).await, 2);

    let err = repo
        .borrowings
        .return_borrowing(borrowing_id, FINE_PER_DAY)
        .await
        .expect_err("Second return must fail");
    assert!(matches!(err, AppError::AlreadyReturned));

    // Incremented exactly once
    assert_eq!(available_copies(&repo.pool, book).await, 2);
    assert_conserved(&repo.pool, book).await;
}

#[tokio::test]
#[ignore]
async fn returned_date_never_changes_once_set() {
    let repo = repository().await;
    let user = seed_user(&repo.pool).await;
    let book = seed_book(&repo.pool, 1).await;

    let borrowing_id = repo
        .borrowings
        .borrow(&borrow_cmd(user, book))
        .await
        .expect("Borrow should succeed");

    let returned = repo
        .borrowings
        .return_borrowing(borrowing_id, FINE_PER_DAY)
        .await
        .expect("Return should succeed");
    let stamp: Option<DateTime<Utc>> = returned.returned_date;

    let _ = repo
        .borrowings
        .return_borrowing(borrowing_id, FINE_PER_DAY)
        .await
        .expect_err("Second return must fail");

    let after = repo
        .borrowings
        .get_by_id(borrowing_id)
        .await
        .expect("Borrowing should still exist");
    assert_eq!(after.returned_date, stamp);
}

#[tokio::test]
#[ignore]
async fn borrowing_a_missing_book_changes_nothing() {
    let repo = repository().await;
    let user = seed_user(&repo.pool).await;

    let before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE user_id = $1")
        .bind(user)
        .fetch_one(&repo.pool)
        .await
        .unwrap();

    let err = repo
        .borrowings
        .borrow(&borrow_cmd(user, -1))
        .await
        .expect_err("Borrowing a missing book must fail");
    assert!(matches!(err, AppError::NotFound(_)));

    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE user_id = $1")
        .bind(user)
        .fetch_one(&repo.pool)
        .await
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
#[ignore]
async fn returning_a_missing_borrowing_fails() {
    let repo = repository().await;

    let err = repo
        .borrowings
        .return_borrowing(-1, FINE_PER_DAY)
        .await
        .expect_err("Returning a missing borrowing must fail");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn failed_borrow_leaves_no_partial_write() {
    let repo = repository().await;
    let user = seed_user(&repo.pool).await;
    let book = seed_book(&repo.pool, 1).await;

    repo.borrowings
        .borrow(&borrow_cmd(user, book))
        .await
        .expect("Borrow should succeed");

    let rows_before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE book_id = $1")
        .bind(book)
        .fetch_one(&repo.pool)
        .await
        .unwrap();

    // The transition aborts after taking the row lock; the rollback must
    // discard the insert and the decrement together.
    let err = repo
        .borrowings
        .borrow(&borrow_cmd(user, book))
        .await
        .expect_err("Borrow with no copies must fail");
    assert!(matches!(err, AppError::NoCopiesAvailable));

    let rows_after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE book_id = $1")
        .bind(book)
        .fetch_one(&repo.pool)
        .await
        .unwrap();
    assert_eq!(rows_before, rows_after, "no borrowing row may persist");
    assert_eq!(available_copies(&repo.pool, book).await, 0);
    assert_conserved(&repo.pool, book).await;
}

#[tokio::test]
#[ignore]
async fn concurrent_borrows_never_oversell() {
    const COPIES: i32 = 3;
    const ATTEMPTS: usize = 8;

    let repo = repository().await;
    let book = seed_book(&repo.pool, COPIES).await;

    let mut users = Vec::new();
    for _ in 0..ATTEMPTS {
        users.push(seed_user(&repo.pool).await);
    }

    let mut handles = Vec::new();
    for user in users {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.borrowings.borrow(&borrow_cmd(user, book)).await
        }));
    }

    let mut successes = 0;
    let mut exhausted = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(AppError::NoCopiesAvailable) => exhausted += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(successes, COPIES as usize);
    assert_eq!(exhausted, ATTEMPTS - COPIES as usize);
    assert_eq!(available_copies(&repo.pool, book).await, 0);
    assert_eq!(open_borrowings(&repo.pool, book).await, COPIES as i64);
    assert_conserved(&repo.pool, book).await;
}

#[tokio::test]
#[ignore]
async fn inventory_is_conserved_across_a_mixed_sequence() {
    let repo = repository().await;
    let user = seed_user(&repo.pool).await;
    let book = seed_book(&repo.pool, 2).await;

    let first = repo.borrowings.borrow(&borrow_cmd(user, book)).await.unwrap();
    assert_conserved(&repo.pool, book).await;

    let second = repo.borrowings.borrow(&borrow_cmd(user, book)).await.unwrap();
    assert_conserved(&repo.pool, book).await;

    let err = repo.borrowings.borrow(&borrow_cmd(user, book)).await;
    assert!(matches!(err, Err(AppError::NoCopiesAvailable)));
    assert_conserved(&repo.pool, book).await;

    repo.borrowings
        .return_borrowing(first, FINE_PER_DAY)
        .await
        .unwrap();
    assert_conserved(&repo.pool, book).await;

    let third = repo.borrowings.borrow(&borrow_cmd(user, book)).await.unwrap();
    assert_conserved(&repo.pool, book).await;

    for id in [second, third] {
        repo.borrowings
            .return_borrowing(id, FINE_PER_DAY)
            .await
            .unwrap();
        assert_conserved(&repo.pool, book).await;
    }

    assert_eq!(available_copies(&repo.pool, book).await, 2);
}

#[tokio::test]
#[ignore]
async fn late_return_is_fined_and_on_time_is_not() {
    let repo = repository().await;
    let user = seed_user(&repo.pool).await;
    let book = seed_book(&repo.pool, 2).await;

    // Overdue by three days
    let late = repo
        .borrowings
        .borrow(&CreateBorrowing {
            user_id: user,
            book_id: book,
            due_date: Utc::now() - Duration::days(3),
        })
        .await
        .unwrap();
    let returned = repo
        .borrowings
        .return_borrowing(late, FINE_PER_DAY)
        .await
        .unwrap();
    assert_eq!(returned.fine_amount, Some(Decimal::new(150, 2)));

    // Due in two weeks
    let on_time = repo.borrowings.borrow(&borrow_cmd(user, book)).await.unwrap();
    let returned = repo
        .borrowings
        .return_borrowing(on_time, FINE_PER_DAY)
        .await
        .unwrap();
    assert_eq!(returned.fine_amount, None);
}

#[tokio::test]
#[ignore]
async fn shrinking_a_book_below_open_borrowings_is_rejected() {
    let repo = repository().await;
    let user = seed_user(&repo.pool).await;
    let book = seed_book(&repo.pool, 2).await;

    repo.borrowings.borrow(&borrow_cmd(user, book)).await.unwrap();
    repo.borrowings.borrow(&borrow_cmd(user, book)).await.unwrap();

    let err = repo
        .books
        .update(
            book,
            &liber_server::models::book::UpdateBook {
                title: None,
                author: None,
                total_copies: Some(1),
            },
        )
        .await
        .expect_err("Shrinking below outstanding borrowings must fail");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_conserved(&repo.pool, book).await;

    // Growing is always fine and keeps the invariant
    let updated = repo
        .books
        .update(
            book,
            &liber_server::models::book::UpdateBook {
                title: None,
                author: None,
                total_copies: Some(5),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.total_copies, 5);
    assert_eq!(updated.available_copies, 3);
    assert_conserved(&repo.pool, book).await;
}
