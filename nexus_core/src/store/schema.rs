use sqlx::SqlitePool;

/// Create tables and indexes if they don't exist.
pub(super) async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_users_table(pool).await?;
    create_blogs_table(pool).await?;
    create_search_history_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            display_name TEXT,
            username TEXT UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_blogs_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blogs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            excerpt TEXT,
            slug TEXT NOT NULL UNIQUE,
            tags TEXT NOT NULL DEFAULT '[]',
            is_published INTEGER NOT NULL DEFAULT 0,
            is_featured INTEGER NOT NULL DEFAULT 0,
            view_count INTEGER NOT NULL DEFAULT 0,
            like_count INTEGER NOT NULL DEFAULT 0,
            comment_count INTEGER NOT NULL DEFAULT 0,
            reading_time INTEGER NOT NULL DEFAULT 0,
            cover_image_url TEXT,
            published_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_blogs_user_id ON blogs(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_blogs_published ON blogs(is_published, published_at)",
    ] {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

async fn create_search_history_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_history (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            query TEXT NOT NULL,
            search_type TEXT NOT NULL,
            results_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_search_history_user ON search_history(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}
