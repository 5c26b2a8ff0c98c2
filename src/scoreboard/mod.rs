pub mod models;

pub use models::{HistoryEntry, Team, TeamId};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised by scoreboard operations. None of them leave partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("cannot subtract {amount} from {team}: total is {total}")]
    InvalidSubtraction { team: TeamId, total: u64, amount: u32 },

    #[error("amount must be a positive integer, got {amount}")]
    InvalidAmount { amount: i64 },

    #[error("adding {amount} to {team} would overflow its total of {total}")]
    ScoreOverflow { team: TeamId, total: u64, amount: u32 },

    #[error("unknown team '{0}' (expected A or B)")]
    UnknownTeam(String),
}

/// Score and history state for one game session.
///
/// Exactly two teams exist for the lifetime of the value. Totals only change
/// through [`add_points`](Self::add_points), [`subtract_points`](Self::subtract_points)
/// and [`reset`](Self::reset), and every successful change except a reset
/// appends one [`HistoryEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreboardState {
    teams: [Team; 2],
    /// Unified, chronological history for both teams
    history: Vec<HistoryEntry>,
}

impl Default for ScoreboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreboardState {
    pub fn new() -> Self {
        ScoreboardState {
            teams: [Team::new(TeamId::A), Team::new(TeamId::B)],
            history: Vec::new(),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    /// Add `amount` points to `team` and record the change.
    pub fn add_points(&mut self, team: TeamId, amount: u32) -> Result<Team, ScoreError> {
        if amount == 0 {
            return Err(ScoreError::InvalidAmount { amount: 0 });
        }
        let current = self.teams[team.index()].total;
        let new_total = current
            .checked_add(u64::from(amount))
            .ok_or(ScoreError::ScoreOverflow {
                team,
                total: current,
                amount,
            })?;

        Ok(self.apply(team, i64::from(amount), new_total))
    }

    /// Subtract `amount` points from `team`. Fails without touching any state
    /// when the total would drop below zero.
    pub fn subtract_points(&mut self, team: TeamId, amount: u32) -> Result<Team, ScoreError> {
        if amount == 0 {
            return Err(ScoreError::InvalidAmount { amount: 0 });
        }
        let current = self.teams[team.index()].total;
        let new_total = current
            .checked_sub(u64::from(amount))
            .ok_or(ScoreError::InvalidSubtraction {
                team,
                total: current,
                amount,
            })?;

        Ok(self.apply(team, -i64::from(amount), new_total))
    }

    /// Rename `team`. Blank names fall back to the team's default name.
    pub fn rename_team(&mut self, team: TeamId, new_name: &str) -> Team {
        let trimmed = new_name.trim();
        let slot = &mut self.teams[team.index()];
        slot.name = if trimmed.is_empty() {
            team.default_name().to_string()
        } else {
            trimmed.to_string()
        };
        slot.clone()
    }

    /// Zero both totals and clear the history. Names are kept.
    pub fn reset(&mut self) {
        for team in self.teams.iter_mut() {
            team.total = 0;
        }
        self.history.clear();
    }

    fn apply(&mut self, team: TeamId, delta: i64, new_total: u64) -> Team {
        let slot = &mut self.teams[team.index()];
        slot.total = new_total;
        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            team,
            delta,
            resulting_total: new_total,
        });
        debug!("{} {:+} -> {}", slot.name, delta, new_total);
        slot.clone()
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Read-only copy of the whole board for rendering.
    pub fn snapshot(&self) -> ScoreboardState {
        self.clone()
    }

    pub fn team(&self, team: TeamId) -> &Team {
        &self.teams[team.index()]
    }

    pub fn teams(&self) -> &[Team; 2] {
        &self.teams
    }

    pub fn total(&self, team: TeamId) -> u64 {
        self.teams[team.index()].total
    }

    /// Unified history, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// History entries for a single team, oldest first.
    pub fn history_for(&self, team: TeamId) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.history.iter().filter(move |e| e.team == team)
    }

    /// Team currently ahead, or `None` on a tie.
    pub fn leader(&self) -> Option<&Team> {
        match self.total(TeamId::A).cmp(&self.total(TeamId::B)) {
            std::cmp::Ordering::Greater => Some(self.team(TeamId::A)),
            std::cmp::Ordering::Less => Some(self.team(TeamId::B)),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = ScoreboardState::new();
        assert_eq!(board.total(TeamId::A), 0);
        assert_eq!(board.total(TeamId::B), 0);
        assert_eq!(board.team(TeamId::A).name, "Team A");
        assert_eq!(board.team(TeamId::B).name, "Team B");
        assert!(board.history().is_empty());
        assert!(board.leader().is_none());
    }

    #[test]
    fn test_add_points_updates_total_and_history() {
        let mut board = ScoreboardState::new();
        for amount in [5, 10, 15, 20, 37] {
            let before = board.total(TeamId::B);
            let len = board.history().len();
            let team = board.add_points(TeamId::B, amount).unwrap();

            assert_eq!(team.total, before + u64::from(amount));
            assert_eq!(board.history().len(), len + 1);
            let last = board.history().last().unwrap();
            assert_eq!(last.team, TeamId::B);
            assert_eq!(last.delta, i64::from(amount));
            assert_eq!(last.resulting_total, team.total);
        }
        assert_eq!(board.total(TeamId::A), 0);
    }

    #[test]
    fn test_add_zero_is_rejected() {
        let mut board = ScoreboardState::new();
        let err = board.add_points(TeamId::A, 0).unwrap_err();
        assert_eq!(err, ScoreError::InvalidAmount { amount: 0 });
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_add_overflow_is_rejected() {
        let mut board = ScoreboardState::new();
        board.teams[TeamId::A.index()].total = u64::MAX - 1;
        let err = board.add_points(TeamId::A, 5).unwrap_err();
        match err {
            ScoreError::ScoreOverflow { team, total, amount } => {
                assert_eq!(team, TeamId::A);
                assert_eq!(total, u64::MAX - 1);
                assert_eq!(amount, 5);
            }
            other => panic!("Expected ScoreOverflow, got {:?}", other),
        }
        assert_eq!(board.total(TeamId::A), u64::MAX - 1);
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_subtract_points_within_total() {
        let mut board = ScoreboardState::new();
        board.add_points(TeamId::A, 20).unwrap();
        let team = board.subtract_points(TeamId::A, 5).unwrap();

        assert_eq!(team.total, 15);
        assert_eq!(board.history().len(), 2);
        let last = board.history().last().unwrap();
        assert_eq!(last.delta, -5);
        assert_eq!(last.resulting_total, 15);
    }

    #[test]
    fn test_subtract_down_to_exactly_zero() {
        let mut board = ScoreboardState::new();
        board.add_points(TeamId::B, 5).unwrap();
        let team = board.subtract_points(TeamId::B, 5).unwrap();
        assert_eq!(team.total, 0);
        assert_eq!(board.history().last().unwrap().resulting_total, 0);
    }

    #[test]
    fn test_subtract_below_zero_leaves_state_untouched() {
        let mut board = ScoreboardState::new();
        board.add_points(TeamId::A, 10).unwrap();
        let before = board.snapshot();

        let err = board.subtract_points(TeamId::A, 11).unwrap_err();
        assert_eq!(
            err,
            ScoreError::InvalidSubtraction {
                team: TeamId::A,
                total: 10,
                amount: 11
            }
        );
        assert_eq!(board, before);

        // Empty team cannot go negative either
        assert!(board.subtract_points(TeamId::B, 5).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_subtract_zero_is_rejected() {
        let mut board = ScoreboardState::new();
        board.add_points(TeamId::A, 10).unwrap();
        assert_eq!(
            board.subtract_points(TeamId::A, 0).unwrap_err(),
            ScoreError::InvalidAmount { amount: 0 }
        );
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn test_rename_trims_and_defaults() {
        let mut board = ScoreboardState::new();
        let team = board.rename_team(TeamId::A, "  Los Carreteros ");
        assert_eq!(team.name, "Los Carreteros");
        assert_eq!(board.team(TeamId::A).name, "Los Carreteros");

        assert_eq!(board.rename_team(TeamId::A, "   \t").name, "Team A");
        assert_eq!(board.rename_team(TeamId::B, "").name, "Team B");
    }

    #[test]
    fn test_rename_does_not_touch_scores() {
        let mut board = ScoreboardState::new();
        board.add_points(TeamId::B, 15).unwrap();
        board.rename_team(TeamId::B, "Visitantes");
        assert_eq!(board.total(TeamId::B), 15);
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn test_reset_keeps_names() {
        let mut board = ScoreboardState::new();
        board.rename_team(TeamId::A, "Casa");
        board.add_points(TeamId::A, 20).unwrap();
        board.add_points(TeamId::B, 10).unwrap();

        board.reset();
        assert_eq!(board.total(TeamId::A), 0);
        assert_eq!(board.total(TeamId::B), 0);
        assert!(board.history().is_empty());
        assert_eq!(board.team(TeamId::A).name, "Casa");
        assert_eq!(board.team(TeamId::B).name, "Team B");

        // Idempotent
        board.reset();
        assert!(board.history().is_empty());
        assert_eq!(board.team(TeamId::A).name, "Casa");
    }

    #[test]
    fn test_history_keeps_call_order_and_filters() {
        let mut board = ScoreboardState::new();
        board.add_points(TeamId::A, 5).unwrap();
        board.add_points(TeamId::B, 10).unwrap();
        assert!(board.subtract_points(TeamId::B, 50).is_err());
        board.add_points(TeamId::A, 15).unwrap();
        board.subtract_points(TeamId::B, 5).unwrap();

        let deltas: Vec<(TeamId, i64)> = board.history().iter().map(|e| (e.team, e.delta)).collect();
        assert_eq!(
            deltas,
            vec![(TeamId::A, 5), (TeamId::B, 10), (TeamId::A, 15), (TeamId::B, -5)]
        );

        let a: Vec<u64> = board.history_for(TeamId::A).map(|e| e.resulting_total).collect();
        let b: Vec<u64> = board.history_for(TeamId::B).map(|e| e.resulting_total).collect();
        assert_eq!(a, vec![5, 20]);
        assert_eq!(b, vec![10, 5]);
    }

    #[test]
    fn test_leader() {
        let mut board = ScoreboardState::new();
        board.add_points(TeamId::B, 10).unwrap();
        assert_eq!(board.leader().map(|t| t.id), Some(TeamId::B));
        board.add_points(TeamId::A, 15).unwrap();
        assert_eq!(board.leader().map(|t| t.id), Some(TeamId::A));
        board.subtract_points(TeamId::A, 5).unwrap();
        assert!(board.leader().is_none());
    }

    #[test]
    fn test_seed_scenario() {
        let mut board = ScoreboardState::new();

        assert_eq!(board.add_points(TeamId::A, 10).unwrap().total, 10);
        assert_eq!(board.add_points(TeamId::A, 15).unwrap().total, 25);
        assert_eq!(board.subtract_points(TeamId::A, 5).unwrap().total, 20);

        let rows: Vec<(TeamId, i64, u64)> = board
            .history()
            .iter()
            .map(|e| (e.team, e.delta, e.resulting_total))
            .collect();
        assert_eq!(
            rows,
            vec![(TeamId::A, 10, 10), (TeamId::A, 15, 25), (TeamId::A, -5, 20)]
        );

        match board.subtract_points(TeamId::A, 100) {
            Err(ScoreError::InvalidSubtraction { total: 20, .. }) => {}
            other => panic!("Expected InvalidSubtraction, got {:?}", other),
        }
        assert_eq!(board.total(TeamId::A), 20);
        assert_eq!(board.history().len(), 3);

        board.reset();
        assert_eq!(board.total(TeamId::A), 0);
        assert_eq!(board.total(TeamId::B), 0);
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_error_messages() {
        let err = ScoreError::InvalidSubtraction {
            team: TeamId::A,
            total: 0,
            amount: 5,
        };
        assert_eq!(err.to_string(), "cannot subtract 5 from A: total is 0");
        assert_eq!(
            ScoreError::UnknownTeam("Z".into()).to_string(),
            "unknown team 'Z' (expected A or B)"
        );
    }
}
