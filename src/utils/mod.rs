use anyhow::{anyhow, Result};
use chrono_tz::Tz;

/// Parse an IANA zone name such as `America/New_York`, `CET` or `UTC`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| anyhow!("unknown timezone '{}'", name))
}

/// Derive a display name from a schedule path slug.
///
/// `/gsw/golden-state-warriors` → `Golden State Warriors`
pub fn team_name_from_path(path: &str) -> Option<String> {
    let slug = path.trim_matches('/').split('/').nth(1)?;
    let words: Vec<String> = slug
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Closest names to `query` by normalized Levenshtein similarity, best first.
pub fn closest_names<'a>(query: &str, names: &'a [String], limit: usize) -> Vec<&'a str> {
    let query = query.to_lowercase();
    let mut scored: Vec<(f64, &str)> = names
        .iter()
        .map(|n| (strsim::normalized_levenshtein(&query, &n.to_lowercase()), n.as_str()))
        .filter(|(score, _)| *score > 0.3)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, n)| n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("CET").unwrap(), chrono_tz::CET);
        assert_eq!(parse_timezone("America/New_York").unwrap(), chrono_tz::America::New_York);
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn test_team_name_from_path() {
        assert_eq!(
            team_name_from_path("/gsw/golden-state-warriors").as_deref(),
            Some("Golden State Warriors")
        );
        assert_eq!(team_name_from_path("/gs/gs-warriors").as_deref(), Some("Gs Warriors"));
        assert_eq!(team_name_from_path("/gsw"), None);
        assert_eq!(team_name_from_path(""), None);
    }

    #[test]
    fn test_closest_names() {
        let names = vec![
            "Golden State Warriors".to_string(),
            "Boston Celtics".to_string(),
            "Houston Rockets".to_string(),
        ];
        assert_eq!(closest_names("Boston Celtic", &names, 1), vec!["Boston Celtics"]);
        assert!(closest_names("zzzz", &names, 3).is_empty());
    }
}
