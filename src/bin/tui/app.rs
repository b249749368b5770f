use std::time::Duration;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror routes.rs shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TrendResponse {
    pub description: String,
    pub bet_category: String,
    pub win_pct: f64,
    pub sample_size: i64,
    #[serde(default)]
    pub win: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct GameTrendsResponse {
    pub game_pk: i64,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    #[serde(default)]
    pub trends: Vec<TrendResponse>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct HealthResponse {
    pub refresh_in_flight: bool,
    pub last_success_at: Option<u64>,
    pub last_error: Option<String>,
    pub total_games: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct RefreshResponse {
    games_upserted: usize,
    evaluation: EvaluationResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct EvaluationResponse {
    rules_matched: usize,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub trends: Vec<TrendResponse>,
    pub games: Vec<GameTrendsResponse>,
    pub health: HealthResponse,
    /// Outcome of the last manual refresh, shown in the footer.
    pub notice: Option<String>,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            trends: Vec::new(),
            games: Vec::new(),
            health: HealthResponse::default(),
            notice: None,
            base_url,
        }
    }

    /// Reload aggregates, today's games and health. A failed core fetch keeps the
    /// previous data on screen and flips the status.
    pub async fn reload(&mut self, client: &reqwest::Client) {
        let trends_url = format!("{}/trends", self.base_url);
        let games_url = format!("{}/games/today/trends", self.base_url);
        let health_url = format!("{}/health", self.base_url);

        let (trends_res, games_res, health_res) = tokio::join!(
            fetch_json::<Vec<TrendResponse>>(client, &trends_url),
            fetch_json::<Vec<GameTrendsResponse>>(client, &games_url),
            fetch_json::<HealthResponse>(client, &health_url),
        );

        match (trends_res, games_res) {
            (Ok(trends), Ok(games)) => {
                self.trends = trends;
                self.games = games;
                self.status = ConnectionStatus::Connected;
                if let Ok(health) = health_res {
                    self.health = health;
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                self.status = ConnectionStatus::Error(e);
            }
        }
    }

    /// POST /refresh, then reload. The server fetches the whole lookback window, so this
    /// gets a longer timeout than the periodic reads.
    pub async fn trigger_refresh(&mut self, client: &reqwest::Client) {
        let url = format!("{}/refresh", self.base_url);
        let res = client
            .post(&url)
            .timeout(Duration::from_secs(120))
            .send()
            .await;

        self.notice = Some(match res {
            Ok(resp) if resp.status() == reqwest::StatusCode::CONFLICT => {
                "refresh already running".to_string()
            }
            Ok(resp) if resp.status().is_success() => match resp.json::<RefreshResponse>().await {
                Ok(r) => format!(
                    "refreshed: {} games, {} trends matched",
                    r.games_upserted, r.evaluation.rules_matched
                ),
                Err(e) => format!("refresh done, unreadable summary: {e}"),
            },
            Ok(resp) => format!("refresh failed: HTTP {}", resp.status()),
            Err(e) => format!("refresh failed: {e}"),
        });

        self.reload(client).await;
    }
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, String> {
    let resp = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?;
    resp.json::<T>().await.map_err(|e| format!("parse error: {e}"))
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_pct(v: f64) -> String {
    format!("{v:.1}%")
}

pub fn game_label(g: &GameTrendsResponse) -> String {
    match (g.away_score, g.home_score) {
        (Some(a), Some(h)) => format!("{} {a} @ {} {h}", g.away_team, g.home_team),
        _ => format!("{} @ {}", g.away_team, g.home_team),
    }
}

pub fn trend_line(t: &TrendResponse) -> String {
    format!(
        "{} — {} win rate (Sample: {})",
        t.description,
        format_pct(t.win_pct),
        t.sample_size
    )
}

/// Unix seconds to HH:MM:SS (UTC).
pub fn format_time_secs(secs: u64) -> String {
    let h = (secs / 3600) % 24;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
