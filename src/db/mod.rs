use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteRow},
    Executor, Row, Sqlite, SqlitePool,
};
use std::str::FromStr;

use crate::models::{Game, GameRecord, Team};

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if let Some(parent) = std::path::Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database(database_url: &str) -> Result<()> {
    let pool = create_pool(database_url).await?;
    init_database_with_pool(&pool).await
}

/// Called from the server and the scraper so schema creation shares their pool.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS games (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL,
            tipoff INTEGER NOT NULL,
            opponent TEXT NOT NULL,
            is_home BOOLEAN NOT NULL,
            FOREIGN KEY (team_id) REFERENCES teams (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_games_team ON games(team_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

// Team operations

/// Insert a team by name, or find the existing one. Returns its id.
pub async fn upsert_team(pool: &SqlitePool, name: &str) -> Result<i64> {
    let row = sqlx::query(
        r#"
        INSERT INTO teams (name) VALUES (?)
        ON CONFLICT(name) DO UPDATE SET name = excluded.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(row.get("id"))
}

pub async fn get_team(pool: &SqlitePool, team_id: i64) -> Result<Option<Team>> {
    let team = sqlx::query_as::<_, Team>("SELECT id, name FROM teams WHERE id = ?")
        .bind(team_id)
        .fetch_optional(pool)
        .await?;
    Ok(team)
}

pub async fn get_all_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let teams = sqlx::query_as::<_, Team>("SELECT id, name FROM teams ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(teams)
}

/// `%needle%` with LIKE wildcards in `needle` escaped by `\`.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring search on team names.
pub async fn find_teams_by_name(pool: &SqlitePool, needle: &str) -> Result<Vec<Team>> {
    let teams = sqlx::query_as::<_, Team>(
        r"SELECT id, name FROM teams WHERE LOWER(name) LIKE LOWER(?) ESCAPE '\' ORDER BY name",
    )
    .bind(contains_pattern(needle))
    .fetch_all(pool)
    .await?;
    Ok(teams)
}

// Game operations

async fn insert_game<'e, E>(executor: E, team_id: i64, game: &GameRecord) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO games (team_id, tipoff, opponent, is_home)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(team_id)
    .bind(game.tipoff().timestamp())
    .bind(game.opponent())
    .bind(game.is_home())
    .fetch_one(executor)
    .await?;

    Ok(row.get("id"))
}

/// Swap a team's stored schedule for `games` in one transaction, so a
/// re-scrape never leaves duplicates or a half-written schedule behind.
pub async fn replace_team_games(
    pool: &SqlitePool,
    team_id: i64,
    games: &[GameRecord],
) -> Result<usize> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM games WHERE team_id = ?")
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

    for game in games {
        insert_game(&mut *tx, team_id, game).await?;
    }

    tx.commit().await?;
    Ok(games.len())
}

fn game_from_row(row: &SqliteRow) -> Result<Game> {
    let epoch: i64 = row.get("tipoff");
    let tipoff: DateTime<Utc> = DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| anyhow!("tipoff {} out of range", epoch))?;

    Ok(Game {
        id: row.get("id"),
        team_id: row.get("team_id"),
        opponent: row.get("opponent"),
        is_home: row.get("is_home"),
        tipoff,
    })
}

pub async fn get_game(pool: &SqlitePool, game_id: i64) -> Result<Option<Game>> {
    let row = sqlx::query(
        "SELECT id, team_id, tipoff, opponent, is_home FROM games WHERE id = ?",
    )
    .bind(game_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(game_from_row).transpose()
}

pub async fn get_games(pool: &SqlitePool) -> Result<Vec<Game>> {
    let rows = sqlx::query(
        "SELECT id, team_id, tipoff, opponent, is_home FROM games ORDER BY tipoff, id",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(game_from_row).collect()
}

pub async fn get_games_for_team(pool: &SqlitePool, team_id: i64) -> Result<Vec<Game>> {
    let rows = sqlx::query(
        r#"
        SELECT id, team_id, tipoff, opponent, is_home FROM games
        WHERE team_id = ?
        ORDER BY tipoff, id
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(game_from_row).collect()
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // One connection that never expires, otherwise the in-memory database vanishes
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_database_with_pool(&pool).await.unwrap();
    pool
}
