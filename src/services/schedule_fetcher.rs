use anyhow::{anyhow, Result};
use reqwest::Client;
use scraper::{Html, Selector};

const SCHEDULE_AFFIX: &str = "/nba/team/schedule/_/name";

/// Downloads team schedule pages and cuts them into three-cell rows.
#[derive(Clone)]
pub struct ScheduleFetcher {
    client: Client,
    base_url: String,
}

impl ScheduleFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Schedule page URL for a team path like `/gsw/golden-state-warriors`.
    pub fn schedule_url(&self, team_path: &str) -> String {
        format!("{}{}{}", self.base_url.trim_end_matches('/'), SCHEDULE_AFFIX, team_path)
    }

    pub async fn fetch_page(&self, team_path: &str) -> Result<String> {
        let url = self.schedule_url(team_path);
        tracing::info!("Fetching schedule page {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Schedule page error {} for {}: {}", status, url, body));
        }

        Ok(response.text().await?)
    }
}

/// Rendered text of the first three `<td>` cells of every table row. Rows
/// with fewer cells (headers, separators) are left out.
pub fn extract_rows(html: &str) -> Vec<[String; 3]> {
    let document = Html::parse_document(html);
    let (Ok(row_selector), Ok(cell_selector)) = (Selector::parse("tr"), Selector::parse("td"))
    else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .filter_map(|row| {
            let mut cells = row
                .select(&cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_string());
            Some([cells.next()?, cells.next()?, cells.next()?])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rows_takes_first_three_cells() {
        let html = r#"<html><body><table>
            <tr><th>DATE</th><th>OPPONENT</th><th>TIME</th></tr>
            <tr>
                <td>Mon Nov 21</td>
                <td><span>vs</span> <a href="/x">Houston Rockets</a>   </td>
                <td>9:30 PM </td>
                <td>ESPN</td>
            </tr>
            <tr><td colspan="3">Regular Season</td></tr>
            <tr><td>Wed Jan 4</td><td>@ Los Angeles Lakers</td><td>W 120-101</td></tr>
        </table></body></html>"#;

        let rows = extract_rows(html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "Mon Nov 21");
        assert_eq!(rows[0][1], "vs Houston Rockets");
        assert_eq!(rows[0][2], "9:30 PM");
        assert_eq!(rows[1][2], "W 120-101");
    }

    #[test]
    fn test_extract_rows_empty_page() {
        assert!(extract_rows("<html><body><p>nothing here</p></body></html>").is_empty());
    }

    #[test]
    fn test_schedule_url() {
        let fetcher = ScheduleFetcher::new("https://www.espn.com/");
        assert_eq!(
            fetcher.schedule_url("/gsw/golden-state-warriors"),
            "https://www.espn.com/nba/team/schedule/_/name/gsw/golden-state-warriors"
        );
    }
}
