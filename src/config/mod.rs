use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::env;

use crate::services::SeasonWindow;
use crate::utils::parse_timezone;

/// Runtime settings, read from the environment (and `.env`) once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub base_url: String,
    pub season: SeasonWindow,
    /// Zone the schedule pages report tipoffs in
    pub source_tz: Tz,
    /// Zone the API shows tipoffs in when the caller does not pick one
    pub display_tz: Tz,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get("PORT", "8080");
        let port = port.parse().with_context(|| format!("invalid PORT '{}'", port))?;

        let start = get("NBASCRAPE_SEASON_START", "2022-08-18");
        let start = parse_date("NBASCRAPE_SEASON_START", &start)?;
        let end = get("NBASCRAPE_SEASON_END", "2023-04-09");
        let end = parse_date("NBASCRAPE_SEASON_END", &end)?;
        if start > end {
            bail!("season start {} is after season end {}", start, end);
        }

        let source_tz =
            parse_timezone(&get("NBASCRAPE_SOURCE_TZ", "EST")).context("NBASCRAPE_SOURCE_TZ")?;
        let display_tz =
            parse_timezone(&get("NBASCRAPE_DISPLAY_TZ", "CET")).context("NBASCRAPE_DISPLAY_TZ")?;

        Ok(Self {
            database_url: get("DATABASE_URL", "sqlite:data/nbascrape.db"),
            port,
            base_url: get("NBASCRAPE_BASE_URL", "https://www.espn.com"),
            season: SeasonWindow::new(start, end),
            source_tz,
            display_tz,
        })
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid {} '{}'", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.port, 8080);
        assert_eq!(s.season.start, NaiveDate::from_ymd_opt(2022, 8, 18).unwrap());
        assert_eq!(s.season.end, NaiveDate::from_ymd_opt(2023, 4, 9).unwrap());
        assert_eq!(s.source_tz, chrono_tz::EST);
        assert_eq!(s.display_tz, chrono_tz::CET);
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("PORT", "3000"),
            ("NBASCRAPE_SEASON_START", "2023-10-01"),
            ("NBASCRAPE_SEASON_END", "2024-04-30"),
            ("NBASCRAPE_DISPLAY_TZ", "Europe/Oslo"),
        ])
        .unwrap();
        assert_eq!(s.port, 3000);
        assert_eq!(s.season.start, NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
        assert_eq!(s.display_tz, chrono_tz::Europe::Oslo);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(settings(&[("PORT", "eighty")]).is_err());
        assert!(settings(&[("NBASCRAPE_SEASON_START", "18/08/2022")]).is_err());
        assert!(settings(&[("NBASCRAPE_SEASON_START", "2023-05-01")]).is_err());
        assert!(settings(&[("NBASCRAPE_SOURCE_TZ", "Nowhere")]).is_err());
    }
}
