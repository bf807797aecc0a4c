//! Schema migrations for the building directory / スキーマ移行
//!
//! Creates the current (normalized) schema generation: buildings plus the
//! three-level architect join tables, and the search history log. The
//! legacy single-table generation is never created here; it is only
//! detected at startup and served through the legacy repository.

use sqlx::SqlitePool;

/// Run database migrations / マイグレーション実行
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS buildings (
            building_id INTEGER PRIMARY KEY AUTOINCREMENT,
            uid TEXT NOT NULL UNIQUE,
            slug TEXT UNIQUE,
            title TEXT NOT NULL,
            title_en TEXT,
            title_norm TEXT NOT NULL DEFAULT '',
            title_en_norm TEXT NOT NULL DEFAULT '',
            location TEXT,
            location_en TEXT,
            prefecture TEXT,
            prefecture_en TEXT,
            building_type TEXT,
            building_type_en TEXT,
            building_type_norm TEXT NOT NULL DEFAULT '',
            building_type_en_norm TEXT NOT NULL DEFAULT '',
            completion_year INTEGER,
            lat REAL,
            lng REAL,
            thumbnail_url TEXT,
            youtube_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS individual_architects (
            individual_architect_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name_ja TEXT NOT NULL,
            name_en TEXT,
            slug TEXT UNIQUE,
            website TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // A credited party is a "composition": one row per member, ordered.
    // An individual is simply a composition with a single member.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS architect_compositions (
            architect_id INTEGER NOT NULL,
            individual_architect_id INTEGER NOT NULL,
            order_index INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (architect_id, order_index),
            FOREIGN KEY (individual_architect_id)
                REFERENCES individual_architects(individual_architect_id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS building_architects (
            building_id INTEGER NOT NULL,
            architect_id INTEGER NOT NULL,
            architect_order INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (building_id, architect_order),
            FOREIGN KEY (building_id)
                REFERENCES buildings(building_id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    ensure_history_table(pool).await?;

    // LIKE and facet filters lean on these / 検索用インデックス
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_buildings_title_norm ON buildings(title_norm)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_buildings_prefecture ON buildings(prefecture)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_buildings_year ON buildings(completion_year)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_buildings_coords ON buildings(lat, lng)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ba_building ON building_architects(building_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ac_architect ON architect_compositions(architect_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ia_slug ON individual_architects(slug)")
        .execute(pool)
        .await?;

    tracing::info!("Database migration completed");

    Ok(())
}

/// The history log is additive and exists in every generation, including
/// legacy databases that otherwise stay untouched.
pub async fn ensure_history_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            query TEXT NOT NULL,
            search_type TEXT NOT NULL,
            searched_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared fixture helpers for repo and service tests.

    use crate::utils::normalize_text;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    pub async fn memory_pool() -> SqlitePool {
        // Single connection: each sqlite::memory: connection is its own DB.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        super::run_migrations(&pool).await.expect("migrations");
        pool
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_building(
        pool: &SqlitePool,
        uid: &str,
        title: &str,
        title_en: Option<&str>,
        prefecture: Option<&str>,
        building_type: Option<&str>,
        completion_year: Option<i64>,
        lat: Option<f64>,
        lng: Option<f64>,
        thumbnail_url: Option<&str>,
        youtube_url: Option<&str>,
    ) -> i64 {
        let now = "2024-01-01T00:00:00Z";
        let result = sqlx::query(
            r#"
            INSERT INTO buildings (
                uid, slug, title, title_en, title_norm, title_en_norm,
                location, location_en, prefecture, prefecture_en,
                building_type, building_type_en,
                building_type_norm, building_type_en_norm,
                completion_year, lat, lng, thumbnail_url, youtube_url,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, ?, NULL, ?, NULL, ?, '', ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uid)
        .bind(uid)
        .bind(title)
        .bind(title_en)
        .bind(normalize_text(title))
        .bind(normalize_text(title_en.unwrap_or("")))
        .bind(prefecture)
        .bind(building_type)
        .bind(normalize_text(building_type.unwrap_or("")))
        .bind(completion_year)
        .bind(lat)
        .bind(lng)
        .bind(thumbnail_url)
        .bind(youtube_url)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .expect("insert building");
        result.last_insert_rowid()
    }

    pub async fn insert_individual(
        pool: &SqlitePool,
        name_ja: &str,
        name_en: Option<&str>,
        slug: &str,
        website: Option<&str>,
    ) -> i64 {
        let result = sqlx::query(
            "INSERT INTO individual_architects (name_ja, name_en, slug, website) VALUES (?, ?, ?, ?)",
        )
        .bind(name_ja)
        .bind(name_en)
        .bind(slug)
        .bind(website)
        .execute(pool)
        .await
        .expect("insert individual");
        result.last_insert_rowid()
    }

    pub async fn add_composition_member(
        pool: &SqlitePool,
        architect_id: i64,
        individual_architect_id: i64,
        order_index: i64,
    ) {
        sqlx::query(
            "INSERT INTO architect_compositions (architect_id, individual_architect_id, order_index) VALUES (?, ?, ?)",
        )
        .bind(architect_id)
        .bind(individual_architect_id)
        .bind(order_index)
        .execute(pool)
        .await
        .expect("insert composition member");
    }

    pub async fn credit_building(
        pool: &SqlitePool,
        building_id: i64,
        architect_id: i64,
        architect_order: i64,
    ) {
        sqlx::query(
            "INSERT INTO building_architects (building_id, architect_id, architect_order) VALUES (?, ?, ?)",
        )
        .bind(building_id)
        .bind(architect_id)
        .bind(architect_order)
        .execute(pool)
        .await
        .expect("insert building credit");
    }
}
