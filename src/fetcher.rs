use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::db::models::DATE_FORMAT;
use crate::error::{AppError, Result};
use crate::types::Game;

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct FetchStats {
    pub dates: usize,
    pub games: usize,
    /// Games with both scores present.
    pub final_games: usize,
    /// Games still waiting on a result.
    pub pending_games: usize,
}

// ---------------------------------------------------------------------------
// Stats API schedule payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Deserialize)]
struct ScheduleDate {
    date: String,
    #[serde(default)]
    games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleGame {
    game_pk: i64,
    teams: ScheduleTeams,
}

#[derive(Debug, Deserialize)]
struct ScheduleTeams {
    home: TeamSide,
    away: TeamSide,
}

#[derive(Debug, Deserialize)]
struct TeamSide {
    team: TeamRef,
    /// Absent or null until the game has a result.
    score: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    name: String,
}

/// Parse a `/schedule` body into games. Any missing required field or malformed date
/// rejects the whole payload.
pub fn parse_schedule(body: &str) -> Result<(Vec<Game>, FetchStats)> {
    let resp: ScheduleResponse =
        serde_json::from_str(body).map_err(|e| AppError::Payload(e.to_string()))?;

    let mut games = Vec::new();
    let mut stats = FetchStats {
        dates: resp.dates.len(),
        ..FetchStats::default()
    };

    for day in resp.dates {
        let date = NaiveDate::parse_from_str(&day.date, DATE_FORMAT)
            .map_err(|e| AppError::Payload(format!("schedule date {:?}: {e}", day.date)))?;

        for g in day.games {
            let game = Game {
                game_pk: g.game_pk,
                date,
                home_team: g.teams.home.team.name,
                away_team: g.teams.away.team.name,
                home_score: g.teams.home.score,
                away_score: g.teams.away.score,
            };
            if game.final_score().is_some() {
                stats.final_games += 1;
            } else {
                stats.pending_games += 1;
            }
            games.push(game);
        }
    }

    stats.games = games.len();
    Ok((games, stats))
}

/// Pulls date-windowed schedules from the MLB Stats API.
#[derive(Clone)]
pub struct ScheduleFetcher {
    client: reqwest::Client,
    base_url: String,
    sport_id: u32,
}

impl ScheduleFetcher {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.mlb_api_url.clone(),
            sport_id: cfg.sport_id,
        })
    }

    pub fn schedule_url(&self, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/schedule?sportId={}&startDate={}&endDate={}",
            self.base_url,
            self.sport_id,
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT),
        )
    }

    /// Fetch every game scheduled in `[start, end]`.
    pub async fn fetch_window(&self, start: NaiveDate, end: NaiveDate) -> Result<(Vec<Game>, FetchStats)> {
        let url = self.schedule_url(start, end);
        debug!("GET {url}");

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let (games, stats) = parse_schedule(&body)?;
        info!(
            event = "SCHEDULE_FETCHED",
            start = %start,
            end = %end,
            dates = stats.dates,
            games = stats.games,
            final_games = stats.final_games,
            pending = stats.pending_games,
            "Fetched {} games ({} final, {} pending) for {start}..{end}",
            stats.games,
            stats.final_games,
            stats.pending_games,
        );
        Ok((games, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "totalGames": 3,
        "dates": [
            {
                "date": "2024-06-01",
                "games": [
                    {
                        "gamePk": 745001,
                        "status": {"detailedState": "Final"},
                        "teams": {
                            "home": {"team": {"id": 112, "name": "Chicago Cubs"}, "score": 5},
                            "away": {"team": {"id": 138, "name": "St. Louis Cardinals"}, "score": 0}
                        }
                    },
                    {
                        "gamePk": 745002,
                        "teams": {
                            "home": {"team": {"name": "Boston Red Sox"}, "score": null},
                            "away": {"team": {"name": "New York Yankees"}}
                        }
                    }
                ]
            },
            {
                "date": "2024-06-02",
                "games": [
                    {
                        "gamePk": 745003,
                        "teams": {
                            "home": {"team": {"name": "Houston Astros"}},
                            "away": {"team": {"name": "Texas Rangers"}}
                        }
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_games_and_keeps_missing_scores_empty() {
        let (games, stats) = parse_schedule(SAMPLE).unwrap();
        assert_eq!(games.len(), 3);
        assert_eq!(stats.dates, 2);
        assert_eq!(stats.final_games, 1);
        assert_eq!(stats.pending_games, 2);

        let cubs = &games[0];
        assert_eq!(cubs.game_pk, 745001);
        assert_eq!(cubs.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(cubs.home_team, "Chicago Cubs");
        assert_eq!(cubs.away_team, "St. Louis Cardinals");
        assert_eq!(cubs.final_score(), Some((5, 0)));

        // null and absent scores are "no result yet", never zero
        assert_eq!(games[1].home_score, None);
        assert_eq!(games[1].away_score, None);
        assert_eq!(games[2].date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn missing_dates_is_an_empty_window() {
        let (games, stats) = parse_schedule(r#"{"totalGames": 0}"#).unwrap();
        assert!(games.is_empty());
        assert_eq!(stats.dates, 0);
    }

    #[test]
    fn missing_team_name_rejects_payload() {
        let raw = r#"{"dates":[{"date":"2024-06-01","games":[
            {"gamePk": 1, "teams": {"home": {"team": {}}, "away": {"team": {"name": "X"}}}}
        ]}]}"#;
        let err = parse_schedule(raw).unwrap_err();
        assert!(matches!(err, AppError::Payload(_)), "got {err:?}");
    }

    #[test]
    fn missing_game_pk_rejects_payload() {
        let raw = r#"{"dates":[{"date":"2024-06-01","games":[
            {"teams": {"home": {"team": {"name": "A"}}, "away": {"team": {"name": "B"}}}}
        ]}]}"#;
        assert!(matches!(parse_schedule(raw), Err(AppError::Payload(_))));
    }

    #[test]
    fn malformed_date_rejects_payload() {
        let raw = r#"{"dates":[{"date":"June 1","games":[]}]}"#;
        assert!(matches!(parse_schedule(raw), Err(AppError::Payload(_))));
    }

    #[test]
    fn builds_windowed_schedule_url() {
        let cfg = Config {
            mlb_api_url: "https://statsapi.mlb.com/api/v1".to_string(),
            sport_id: 1,
            lookback_days: 30,
            log_level: "info".to_string(),
            db_path: ":memory:".to_string(),
            api_port: 3000,
            http_timeout_secs: 5,
            refresh_on_start: false,
            refresh_interval_secs: 0,
        };
        let fetcher = ScheduleFetcher::new(&cfg).unwrap();
        let url = fetcher.schedule_url(
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
        );
        assert_eq!(
            url,
            "https://statsapi.mlb.com/api/v1/schedule?sportId=1&startDate=2024-05-17&endDate=2024-06-16"
        );
    }
}
