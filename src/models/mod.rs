use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One game read off a schedule page. Identity is left unassigned until the
/// record is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    id: Option<i64>,
    team_id: Option<i64>,
    opponent: String,
    is_home: bool,
    tipoff: DateTime<FixedOffset>,
}

impl GameRecord {
    pub(crate) fn new(opponent: String, is_home: bool, tipoff: DateTime<FixedOffset>) -> Self {
        Self {
            id: None,
            team_id: None,
            opponent,
            is_home,
            tipoff,
        }
    }

    /// Unset until the record is stored; stored games are read back as [`Game`].
    #[allow(dead_code)]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    #[allow(dead_code)]
    pub fn team_id(&self) -> Option<i64> {
        self.team_id
    }

    pub fn opponent(&self) -> &str {
        &self.opponent
    }

    pub fn is_home(&self) -> bool {
        self.is_home
    }

    pub fn tipoff(&self) -> DateTime<FixedOffset> {
        self.tipoff
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

/// A stored game. `tipoff` lives in the database as UTC epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub team_id: i64,
    pub opponent: String,
    pub is_home: bool,
    pub tipoff: DateTime<Utc>,
}

/// A stored game with its tipoff shown in a caller-chosen zone. The instant
/// is the same as the stored one; only the offset in the output changes.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub id: i64,
    pub team_id: i64,
    pub opponent: String,
    pub is_home: bool,
    pub tipoff: DateTime<FixedOffset>,
}

impl GameView {
    pub fn project<Tz: TimeZone>(game: Game, tz: &Tz) -> Self {
        Self {
            id: game.id,
            team_id: game.team_id,
            opponent: game.opponent,
            is_home: game.is_home,
            tipoff: game.tipoff.with_timezone(tz).fixed_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamSchedule {
    pub team: Team,
    pub games: Vec<GameView>,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_keeps_the_instant() {
        let game = Game {
            id: 7,
            team_id: 1,
            opponent: "Houston Rockets".to_string(),
            is_home: true,
            tipoff: Utc.with_ymd_and_hms(2022, 11, 22, 2, 30, 0).unwrap(),
        };
        let view = GameView::project(game.clone(), &chrono_tz::CET);

        assert_eq!(view.tipoff, game.tipoff);
        assert_eq!(view.tipoff.to_rfc3339(), "2022-11-22T03:30:00+01:00");
    }

    #[test]
    fn test_game_view_serializes_with_offset() {
        let game = Game {
            id: 1,
            team_id: 2,
            opponent: "Orlando Magic".to_string(),
            is_home: false,
            tipoff: Utc.with_ymd_and_hms(2023, 4, 15, 22, 0, 0).unwrap(),
        };
        let view = GameView::project(game, &chrono_tz::America::New_York);
        let json = serde_json::to_value(view).unwrap();

        assert_eq!(json["tipoff"], "2023-04-15T18:00:00-04:00");
        assert_eq!(json["is_home"], false);
        assert_eq!(json["opponent"], "Orlando Magic");
    }
}
