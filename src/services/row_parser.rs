use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone};
use thiserror::Error;

use crate::models::GameRecord;

/// Why a schedule row could not be turned into a game. Each variant keeps
/// the offending cell text so the driver can log it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed date cell {0:?}")]
    MalformedDate(String),
    #[error("unrecognized opponent cell {0:?}")]
    UnrecognizedOpponentFormat(String),
    #[error("malformed time cell {0:?}")]
    MalformedTime(String),
}

/// The `[start, end]` date range of one season. Only used to pick the year
/// for date cells that carry no year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeasonWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Place a month/day in the season: the start year, or the following
    /// year when that would land before the season starts.
    fn resolve_date(&self, month: u32, day: u32) -> Option<NaiveDate> {
        let year = self.start.year();
        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) if date >= self.start => Some(date),
            _ => NaiveDate::from_ymd_opt(year + 1, month, day),
        }
    }

    /// Whether the calendar date of `instant`, in its own zone, lies inside the window.
    pub fn contains<Tz: TimeZone>(&self, instant: &chrono::DateTime<Tz>) -> bool {
        let date = instant.date_naive();
        self.start <= date && date <= self.end
    }
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_number(abbrev: &str) -> Option<u32> {
    MONTHS.iter().position(|m| *m == abbrev).map(|i| i as u32 + 1)
}

// "Tue Oct 18"
fn parse_date_cell(cell: &str) -> Result<(u32, u32), ParseError> {
    let malformed = || ParseError::MalformedDate(cell.to_string());

    let tokens: Vec<&str> = cell.split_whitespace().collect();
    let [_weekday, month, day] = tokens.as_slice() else {
        return Err(malformed());
    };

    let month = month_number(month).ok_or_else(malformed)?;
    let day = day
        .parse::<u32>()
        .ok()
        .filter(|d| (1..=31).contains(d))
        .ok_or_else(malformed)?;

    Ok((month, day))
}

// "vs Houston Rockets   " or "@ Los Angeles Lakers"
fn parse_opponent_cell(cell: &str) -> Result<(String, bool), ParseError> {
    let (rest, is_home) = if let Some(rest) = cell.strip_prefix("vs ") {
        (rest, true)
    } else if let Some(rest) = cell.strip_prefix("@ ") {
        (rest, false)
    } else {
        return Err(ParseError::UnrecognizedOpponentFormat(cell.to_string()));
    };

    let opponent = rest.trim();
    if opponent.is_empty() {
        return Err(ParseError::UnrecognizedOpponentFormat(cell.to_string()));
    }

    Ok((opponent.to_string(), is_home))
}

// "9:30 PM " for upcoming games, "W 112-98" / "L 101-110" for played ones.
// Played games carry no time, so they are pinned to midnight.
fn parse_time_cell(cell: &str) -> Result<NaiveTime, ParseError> {
    let trimmed = cell.trim_start();
    if trimmed.starts_with('W') || trimmed.starts_with('L') {
        return Ok(NaiveTime::MIN);
    }

    let malformed = || ParseError::MalformedTime(cell.to_string());

    let mut tokens = trimmed.split_whitespace();
    let (Some(clock), Some(meridiem)) = (tokens.next(), tokens.next()) else {
        return Err(malformed());
    };

    let (hour, minute) = clock.split_once(':').ok_or_else(malformed)?;
    let hour: u32 = hour.parse().map_err(|_| malformed())?;
    let minute: u32 = minute.parse().map_err(|_| malformed())?;
    if !(1..=12).contains(&hour) {
        return Err(malformed());
    }

    // 12 PM is noon and 12 AM is midnight
    let hour = match meridiem {
        "AM" => hour % 12,
        "PM" => hour % 12 + 12,
        _ => return Err(malformed()),
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(malformed)
}

/// Turn the `[date, opponent, time]` cells of one schedule row into a game.
///
/// Times are read in `reference_tz`, the zone the source reports every game
/// in. The result is accepted even when it falls outside `season`; callers
/// can check [`SeasonWindow::contains`] if they care.
pub fn parse_row<Tz: TimeZone>(
    cells: [&str; 3],
    season: &SeasonWindow,
    reference_tz: &Tz,
) -> Result<GameRecord, ParseError> {
    let [date_cell, opponent_cell, time_cell] = cells;

    let (month, day) = parse_date_cell(date_cell)?;
    let (opponent, is_home) = parse_opponent_cell(opponent_cell)?;
    let time = parse_time_cell(time_cell)?;

    let date = season
        .resolve_date(month, day)
        .ok_or_else(|| ParseError::MalformedDate(date_cell.to_string()))?;

    // A local time inside a DST gap has no instant; on an overlap take the first.
    let tipoff = reference_tz
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| ParseError::MalformedTime(time_cell.to_string()))?
        .fixed_offset();

    Ok(GameRecord::new(opponent, is_home, tipoff))
}

/// Parse every row, dropping the ones that fail. A bad row is logged and
/// never stops the rest of the page.
pub fn parse_rows<'a, Tz, I>(
    rows: I,
    season: &'a SeasonWindow,
    reference_tz: &'a Tz,
) -> impl Iterator<Item = GameRecord> + 'a
where
    Tz: TimeZone,
    I: IntoIterator<Item = [String; 3]> + 'a,
    I::IntoIter: 'a,
{
    rows.into_iter().filter_map(move |row| {
        match parse_row(row.each_ref().map(String::as_str), season, reference_tz) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("Skipping schedule row: {}", e);
                None
            }
        }
    })
}
