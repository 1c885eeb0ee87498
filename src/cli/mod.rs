use anyhow::Result;
use chrono_tz::Tz;
use sqlx::SqlitePool;
use std::path::Path;
use tokio::task::JoinSet;

use crate::config::Settings;
use crate::db::{
    create_pool, find_teams_by_name, get_all_teams, get_games, get_games_for_team,
    init_database_with_pool, replace_team_games, upsert_team,
};
use crate::models::{GameRecord, GameView};
use crate::services::{extract_rows, parse_rows, ScheduleFetcher, SeasonWindow};
use crate::utils::{closest_names, team_name_from_path};

/// Parse a schedule page and replace the team's stored games with what it holds.
pub async fn ingest_page(
    pool: &SqlitePool,
    settings: &Settings,
    team_name: &str,
    html: &str,
) -> Result<usize> {
    let games = games_from_page(html, &settings.season, &settings.source_tz);
    let team_id = upsert_team(pool, team_name).await?;
    let stored = replace_team_games(pool, team_id, &games).await?;
    tracing::info!("Inserted {} games for {}", stored, team_name);
    Ok(stored)
}

fn games_from_page(html: &str, season: &SeasonWindow, source_tz: &Tz) -> Vec<GameRecord> {
    let rows = extract_rows(html);
    let total = rows.len();

    let games: Vec<GameRecord> = parse_rows(rows, season, source_tz)
        .inspect(|game| {
            if !season.contains(&game.tipoff()) {
                tracing::warn!(
                    "{} vs {} falls outside the season window",
                    game.tipoff(),
                    game.opponent()
                );
            }
        })
        .collect();

    tracing::debug!("Parsed {} of {} rows", games.len(), total);
    games
}

/// Split team page paths into `(name, path)` pairs and the paths no team
/// name can be derived from.
fn team_targets(paths: &[String]) -> (Vec<(String, String)>, Vec<String>) {
    let mut targets = Vec::new();
    let mut rejected = Vec::new();
    for path in paths {
        match team_name_from_path(path) {
            Some(name) => targets.push((name, path.clone())),
            None => rejected.push(path.clone()),
        }
    }
    (targets, rejected)
}

/// Fetch every team page concurrently. One failing page is logged and does
/// not stop the others.
pub async fn scrape_teams(settings: &Settings, paths: &[String]) -> Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;
    let fetcher = ScheduleFetcher::new(settings.base_url.clone());

    println!("🏀 Scraping {} team schedule(s)...", paths.len());

    let (targets, rejected) = team_targets(paths);
    for path in &rejected {
        tracing::warn!("Cannot derive a team name from '{}', skipping", path);
    }

    let mut tasks = JoinSet::new();
    for (name, path) in targets {
        let (pool, fetcher, settings) = (pool.clone(), fetcher.clone(), settings.clone());

        tasks.spawn(async move {
            let result = async {
                let html = fetcher.fetch_page(&path).await?;
                ingest_page(&pool, &settings, &name, &html).await
            }
            .await;
            (name, result)
        });
    }

    let mut total = 0usize;
    let mut failed = rejected.len();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(count))) => {
                println!("   • {}: {} games", name, count);
                total += count;
            }
            Ok((name, Err(e))) => {
                tracing::warn!("Failed to scrape {}: {:#}", name, e);
                failed += 1;
            }
            Err(e) => {
                tracing::error!("Scrape task panicked: {}", e);
                failed += 1;
            }
        }
    }

    println!("✅ Stored {} games ({} team page(s) failed)", total, failed);
    Ok(())
}

/// Ingest a schedule page saved to disk.
pub async fn scrape_file(settings: &Settings, file: &Path, team_name: &str) -> Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;

    let html = tokio::fs::read_to_string(file).await?;
    let count = ingest_page(&pool, settings, team_name, &html).await?;

    println!("✅ Stored {} games for {}", count, team_name);
    Ok(())
}

pub async fn list(settings: &Settings) -> Result<()> {
    let pool = create_pool(&settings.database_url).await?;

    let teams = get_all_teams(&pool).await?;
    if teams.is_empty() {
        println!("📭 No teams stored. Try: nbascrape scrape --path /gsw/golden-state-warriors");
        return Ok(());
    }

    for team in teams {
        println!("Team [{}]: {}", team.id, team.name);
        for game in get_games_for_team(&pool, team.id).await? {
            let game = GameView::project(game, &settings.display_tz);
            let venue = if game.is_home { "vs" } else { "@" };
            println!(
                "    [{}] {} {} {}",
                game.id,
                game.tipoff.format("%Y-%m-%d %H:%M %:z"),
                venue,
                game.opponent
            );
        }
    }

    Ok(())
}

pub async fn query_team(settings: &Settings, team_name: &str) -> Result<()> {
    let pool = create_pool(&settings.database_url).await?;

    println!("🔍 Searching for team: {}", team_name);

    let teams = find_teams_by_name(&pool, team_name).await?;

    if teams.is_empty() {
        println!("❌ No teams found matching '{}'", team_name);

        let names: Vec<String> = get_all_teams(&pool)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();
        let suggestions = closest_names(team_name, &names, 5);
        if !suggestions.is_empty() {
            println!("\n💡 Did you mean:");
            for name in suggestions {
                println!("   • {}", name);
            }
        }
        return Ok(());
    }

    if teams.len() > 1 {
        println!("📋 Found {} teams matching '{}':\n", teams.len(), team_name);
        for (i, team) in teams.iter().enumerate() {
            println!("{}. {}", i + 1, team.name);
        }
        println!("\n🔍 Showing details for first match:");
    }

    let team = &teams[0];
    let games = get_games_for_team(&pool, team.id).await?;
    let home = games.iter().filter(|g| g.is_home).count();

    println!(
        "📊 {} ({} games, {} home / {} away)",
        team.name,
        games.len(),
        home,
        games.len() - home
    );
    for game in games {
        let game = GameView::project(game, &settings.display_tz);
        let venue = if game.is_home { "vs" } else { "at" };
        println!("   {} {} {}", game.tipoff.format("%m/%d %H:%M"), venue, game.opponent);
    }

    Ok(())
}

/// Write every stored game as CSV, tipoffs in the display zone.
pub async fn export_csv(settings: &Settings, out: &Path) -> Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    let games = get_games(&pool).await?;

    let mut writer = csv::Writer::from_path(out)?;
    writer.write_record(["id", "team_id", "tipoff", "opponent", "is_home"])?;
    for game in &games {
        let view = GameView::project(game.clone(), &settings.display_tz);
        writer.write_record([
            view.id.to_string(),
            view.team_id.to_string(),
            view.tipoff.to_rfc3339(),
            view.opponent,
            view.is_home.to_string(),
        ])?;
    }
    writer.flush()?;

    println!("✅ Exported {} games to {}", games.len(), out.display());
    Ok(())
}
