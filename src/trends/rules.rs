//! The hard-coded trend rules.
//!
//! Every rule is a single forward pass over completed games in date order. For each
//! game the rule first decides whether the game qualifies using only the state built
//! from earlier games, then folds the game's result into that state. State lives in a
//! rule-local object created fresh for each scan.

use std::collections::HashMap;

use chrono::Datelike;

use crate::config::trend_params::*;
use crate::types::{BetCategory, CompletedGame, TrendMatch, TrendReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendRule {
    HomeLossStreakOnSunday,
    AwayLossStreakOnTuesday,
    PowerHittersOver,
    FavoriteAfterShutout,
}

impl TrendRule {
    pub const ALL: [TrendRule; 4] = [
        TrendRule::HomeLossStreakOnSunday,
        TrendRule::AwayLossStreakOnTuesday,
        TrendRule::PowerHittersOver,
        TrendRule::FavoriteAfterShutout,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            TrendRule::HomeLossStreakOnSunday => "Home teams after 2 losses on Sunday",
            TrendRule::AwayLossStreakOnTuesday => "Away teams on 3-game losing streaks on Tuesday",
            TrendRule::PowerHittersOver => "Over hits when both teams hit 2+ HR in last game",
            TrendRule::FavoriteAfterShutout => "Favorites after a shutout loss",
        }
    }

    pub fn bet_category(&self) -> BetCategory {
        match self {
            TrendRule::PowerHittersOver => BetCategory::OverUnder,
            _ => BetCategory::Moneyline,
        }
    }

    /// Scan `games` (completed, already in date order) and collect qualifying games.
    pub fn scan(&self, games: &[CompletedGame]) -> TrendReport {
        let matches = match self {
            TrendRule::HomeLossStreakOnSunday => scan_with(games, LossStreaks::default(), home_streak_on_sunday),
            TrendRule::AwayLossStreakOnTuesday => scan_with(games, AwayLossStreaks::default(), away_streak_on_tuesday),
            TrendRule::PowerHittersOver => scan_with(games, PowerSignals::default(), power_hitters_over),
            TrendRule::FavoriteAfterShutout => scan_with(games, LastScores::default(), favorite_after_shutout),
        };
        TrendReport {
            description: self.description(),
            bet_category: self.bet_category(),
            matches,
        }
    }
}

/// Per-team state a rule carries through the pass.
trait TeamState {
    fn record(&mut self, game: &CompletedGame);
}

fn scan_with<S: TeamState>(
    games: &[CompletedGame],
    mut state: S,
    qualify: fn(&S, &CompletedGame) -> Option<bool>,
) -> Vec<TrendMatch> {
    let mut matches = Vec::new();
    for game in games {
        if let Some(win) = qualify(&state, game) {
            matches.push(TrendMatch { game_pk: game.game_pk, win });
        }
        state.record(game);
    }
    matches
}

// ---------------------------------------------------------------------------
// Home team on a losing streak, Sunday
// ---------------------------------------------------------------------------

/// Consecutive losses per team, home or away. A loss is a strictly lower score; any other
/// result resets the team's count.
#[derive(Debug, Default)]
pub struct LossStreaks {
    streaks: HashMap<String, u32>,
}

impl LossStreaks {
    pub fn get(&self, team: &str) -> u32 {
        self.streaks.get(team).copied().unwrap_or(0)
    }

    fn bump_or_reset(&mut self, team: &str, lost: bool) {
        let streak = self.streaks.entry(team.to_string()).or_insert(0);
        *streak = if lost { *streak + 1 } else { 0 };
    }
}

impl TeamState for LossStreaks {
    fn record(&mut self, game: &CompletedGame) {
        self.bump_or_reset(&game.home_team, game.home_score < game.away_score);
        self.bump_or_reset(&game.away_team, game.away_score < game.home_score);
    }
}

fn home_streak_on_sunday(state: &LossStreaks, game: &CompletedGame) -> Option<bool> {
    let qualifies = state.get(&game.home_team) >= HOME_LOSS_STREAK
        && game.date.weekday() == HOME_STREAK_WEEKDAY;
    qualifies.then_some(game.home_score > game.away_score)
}

// ---------------------------------------------------------------------------
// Away team on a road losing streak, Tuesday
// ---------------------------------------------------------------------------

/// Consecutive losses per team counted only over games it played as the visitor.
#[derive(Debug, Default)]
pub struct AwayLossStreaks {
    inner: LossStreaks,
}

impl AwayLossStreaks {
    pub fn get(&self, team: &str) -> u32 {
        self.inner.get(team)
    }
}

impl TeamState for AwayLossStreaks {
    fn record(&mut self, game: &CompletedGame) {
        self.inner
            .bump_or_reset(&game.away_team, game.away_score < game.home_score);
    }
}

fn away_streak_on_tuesday(state: &AwayLossStreaks, game: &CompletedGame) -> Option<bool> {
    let qualifies = state.get(&game.away_team) >= AWAY_LOSS_STREAK
        && game.date.weekday() == AWAY_STREAK_WEEKDAY;
    qualifies.then_some(game.away_score > game.home_score)
}

// ---------------------------------------------------------------------------
// Both teams showed power last time out, over
// ---------------------------------------------------------------------------

/// Placeholder for a team's home run count in its previous game. The feed has no home
/// run data, so a team that scored POWER_PROXY_MIN_RUNS or more is treated as a 2-HR game.
pub fn power_proxy(runs: i64) -> u32 {
    if runs >= POWER_PROXY_MIN_RUNS {
        POWER_PROXY_SIGNAL
    } else {
        0
    }
}

/// Proxy power signal from each team's most recent game.
#[derive(Debug, Default)]
pub struct PowerSignals {
    last: HashMap<String, u32>,
}

impl PowerSignals {
    pub fn get(&self, team: &str) -> u32 {
        self.last.get(team).copied().unwrap_or(0)
    }
}

impl TeamState for PowerSignals {
    fn record(&mut self, game: &CompletedGame) {
        self.last.insert(game.home_team.clone(), power_proxy(game.home_score));
        self.last.insert(game.away_team.clone(), power_proxy(game.away_score));
    }
}

fn power_hitters_over(state: &PowerSignals, game: &CompletedGame) -> Option<bool> {
    let qualifies = state.get(&game.home_team) >= POWER_SIGNAL_THRESHOLD
        && state.get(&game.away_team) >= POWER_SIGNAL_THRESHOLD;
    qualifies.then_some(game.total_runs() > OVER_LINE)
}

// ---------------------------------------------------------------------------
// Favorite coming off a shutout
// ---------------------------------------------------------------------------

/// Runs each team scored in its most recent game.
#[derive(Debug, Default)]
pub struct LastScores {
    last: HashMap<String, i64>,
}

impl LastScores {
    pub fn get(&self, team: &str) -> Option<i64> {
        self.last.get(team).copied()
    }

    /// Placeholder for market odds: the home side is the favorite when it scored at
    /// least as many runs in its last game as the visitor did in theirs. A team with no
    /// history counts as zero.
    pub fn home_is_favorite(&self, game: &CompletedGame) -> bool {
        self.get(&game.home_team).unwrap_or(0) >= self.get(&game.away_team).unwrap_or(0)
    }
}

impl TeamState for LastScores {
    fn record(&mut self, game: &CompletedGame) {
        self.last.insert(game.home_team.clone(), game.home_score);
        self.last.insert(game.away_team.clone(), game.away_score);
    }
}

fn favorite_after_shutout(state: &LastScores, game: &CompletedGame) -> Option<bool> {
    let shut_out_last_game = state.get(&game.home_team) == Some(0);
    let qualifies = shut_out_last_game && state.home_is_favorite(game);
    qualifies.then_some(game.home_score > game.away_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2024-06-02 is a Sunday, 2024-06-04 a Tuesday.
    fn day(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    fn game(game_pk: i64, date: &str, home: &str, away: &str, hs: i64, aws: i64) -> CompletedGame {
        CompletedGame {
            game_pk,
            date: day(date),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_score: hs,
            away_score: aws,
        }
    }

    fn pks(report: &TrendReport) -> Vec<(i64, bool)> {
        report.matches.iter().map(|m| (m.game_pk, m.win)).collect()
    }

    #[test]
    fn home_streak_three_sundays_lose_lose_win() {
        let games = vec![
            game(1, "2024-06-02", "A", "B", 1, 4),
            game(2, "2024-06-09", "A", "C", 2, 3),
            game(3, "2024-06-16", "A", "D", 6, 2),
        ];
        let report = TrendRule::HomeLossStreakOnSunday.scan(&games);
        assert_eq!(pks(&report), vec![(3, true)]);
        assert_eq!(report.win_pct(), Some(100.0));
        assert_eq!(report.sample_size(), 1);
    }

    #[test]
    fn home_streak_uses_pre_game_state_only() {
        // A's second loss comes on Sunday itself; that game must not qualify.
        let games = vec![
            game(1, "2024-06-01", "A", "B", 1, 4),
            game(2, "2024-06-02", "A", "B", 0, 2),
        ];
        let report = TrendRule::HomeLossStreakOnSunday.scan(&games);
        assert!(report.matches.is_empty());
    }

    #[test]
    fn home_streak_counts_road_losses_and_resets_on_win() {
        let games = vec![
            // A loses on the road twice
            game(1, "2024-06-05", "X", "A", 5, 1),
            game(2, "2024-06-06", "Y", "A", 5, 1),
            // ...so the Sunday home game qualifies and A loses again
            game(3, "2024-06-09", "A", "Z", 0, 1),
            // A wins, streak resets
            game(4, "2024-06-12", "A", "Z", 4, 1),
            game(5, "2024-06-16", "A", "Z", 1, 9),
        ];
        let report = TrendRule::HomeLossStreakOnSunday.scan(&games);
        assert_eq!(pks(&report), vec![(3, false)]);
        assert_eq!(report.win_pct(), Some(0.0));
    }

    #[test]
    fn home_streak_ignores_other_weekdays() {
        let games = vec![
            game(1, "2024-06-03", "A", "B", 1, 4),
            game(2, "2024-06-04", "A", "B", 1, 4),
            game(3, "2024-06-05", "A", "B", 7, 4),
        ];
        assert!(TrendRule::HomeLossStreakOnSunday.scan(&games).matches.is_empty());
    }

    #[test]
    fn tie_resets_streaks() {
        let mut streaks = LossStreaks::default();
        streaks.record(&game(1, "2024-06-01", "A", "B", 1, 4));
        assert_eq!(streaks.get("A"), 1);
        streaks.record(&game(2, "2024-06-02", "A", "B", 3, 3));
        assert_eq!(streaks.get("A"), 0);
        assert_eq!(streaks.get("B"), 0);
    }

    #[test]
    fn away_streak_only_counts_road_games() {
        let games = vec![
            game(1, "2024-05-28", "H1", "V", 5, 2),
            game(2, "2024-05-29", "H2", "V", 5, 2),
            // a home loss does not extend the road streak
            game(3, "2024-05-30", "V", "H3", 1, 8),
            game(4, "2024-06-04", "H4", "V", 3, 4),
        ];
        assert!(TrendRule::AwayLossStreakOnTuesday.scan(&games).matches.is_empty());

        let games = vec![
            game(1, "2024-05-28", "H1", "V", 5, 2),
            game(2, "2024-05-29", "H2", "V", 5, 2),
            game(3, "2024-05-30", "H3", "V", 5, 2),
            game(4, "2024-06-04", "H4", "V", 3, 4),
            // streak reset by the Tuesday win
            game(5, "2024-06-11", "H5", "V", 3, 1),
        ];
        let report = TrendRule::AwayLossStreakOnTuesday.scan(&games);
        assert_eq!(pks(&report), vec![(4, true)]);
        assert_eq!(report.bet_category, BetCategory::Moneyline);
    }

    #[test]
    fn power_hitters_need_both_teams() {
        let games = vec![
            game(1, "2024-06-01", "A", "X", 6, 1),
            game(2, "2024-06-01", "B", "Y", 5, 7),
            // A and B both scored 5+ last time out
            game(3, "2024-06-02", "A", "B", 5, 4),
            // A scored 5, B scored 4 → B's signal is 0
            game(4, "2024-06-03", "A", "B", 10, 2),
            // X scored 1 last time
            game(5, "2024-06-04", "A", "X", 3, 3),
        ];
        let report = TrendRule::PowerHittersOver.scan(&games);
        assert_eq!(pks(&report), vec![(3, true)]);
        assert_eq!(report.bet_category, BetCategory::OverUnder);
    }

    #[test]
    fn over_line_is_strict() {
        let games = vec![
            game(1, "2024-06-01", "A", "X", 6, 1),
            game(2, "2024-06-01", "B", "Y", 5, 7),
            game(3, "2024-06-02", "A", "B", 4, 4),
        ];
        let report = TrendRule::PowerHittersOver.scan(&games);
        assert_eq!(pks(&report), vec![(3, false)]);
    }

    #[test]
    fn power_proxy_threshold() {
        assert_eq!(power_proxy(4), 0);
        assert_eq!(power_proxy(5), 2);
        assert_eq!(power_proxy(12), 2);
    }

    #[test]
    fn favorite_after_shutout_requires_prior_zero() {
        let games = vec![
            // A shut out, B also held scoreless
            game(1, "2024-06-01", "X", "A", 3, 0),
            game(2, "2024-06-01", "B", "Y", 0, 2),
            // A (0) vs B (0): A is the favorite by the proxy
            game(3, "2024-06-02", "A", "B", 2, 1),
            // A now has 2 runs last game, no longer coming off a shutout
            game(4, "2024-06-03", "A", "B", 0, 1),
        ];
        let report = TrendRule::FavoriteAfterShutout.scan(&games);
        assert_eq!(pks(&report), vec![(3, true)]);
    }

    #[test]
    fn favorite_after_shutout_records_losses() {
        let games = vec![
            game(1, "2024-06-01", "X", "A", 3, 0),
            // B has no history, counts as zero → A still favored; A loses
            game(2, "2024-06-02", "A", "B", 1, 5),
        ];
        let report = TrendRule::FavoriteAfterShutout.scan(&games);
        assert_eq!(pks(&report), vec![(2, false)]);
        assert_eq!(report.win_pct(), Some(0.0));
    }

    #[test]
    fn shutout_team_facing_scoring_opponent_is_not_favorite() {
        let games = vec![
            game(1, "2024-06-01", "X", "A", 3, 0),
            game(2, "2024-06-01", "B", "Y", 4, 2),
            game(3, "2024-06-02", "A", "B", 5, 1),
        ];
        assert!(TrendRule::FavoriteAfterShutout.scan(&games).matches.is_empty());
    }

    #[test]
    fn no_history_means_no_match() {
        let games = vec![game(1, "2024-06-02", "A", "B", 0, 0)];
        for rule in TrendRule::ALL {
            assert!(rule.scan(&games).matches.is_empty(), "{rule:?}");
        }
    }
}
