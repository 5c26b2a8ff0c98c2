use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ScoreError;

/// One of the two fixed sides of a domino pairs game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamId {
    A,
    B,
}

impl TeamId {
    /// Slot of this team in the scoreboard's fixed two-element array.
    pub fn index(self) -> usize {
        match self {
            TeamId::A => 0,
            TeamId::B => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TeamId::A => "A",
            TeamId::B => "B",
        }
    }

    /// Name shown when the team has never been renamed or its name was cleared.
    pub fn default_name(self) -> &'static str {
        match self {
            TeamId::A => "Team A",
            TeamId::B => "Team B",
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamId {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(TeamId::A),
            "B" | "b" => Ok(TeamId::B),
            other => Err(ScoreError::UnknownTeam(other.to_string())),
        }
    }
}

/// A team's name and running total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Trimmed, never empty
    pub name: String,
    pub total: u64,
}

impl Team {
    pub fn new(id: TeamId) -> Self {
        Team {
            id,
            name: id.default_name().to_string(),
            total: 0,
        }
    }
}

/// A single applied score change. Entries are never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub team: TeamId,
    /// Signed change that was applied (+10, -5, ...)
    pub delta: i64,
    /// Team total immediately after this change
    pub resulting_total: u64,
}

impl HistoryEntry {
    /// Delta with an explicit sign, e.g. "+10" or "-5".
    pub fn signed_delta(&self) -> String {
        format!("{:+}", self.delta)
    }

    /// UTC wall clock rendering used by the history tables.
    pub fn display_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_team_id_parsing() {
        assert_eq!("A".parse::<TeamId>().unwrap(), TeamId::A);
        assert_eq!(" b ".parse::<TeamId>().unwrap(), TeamId::B);
    }

    #[test]
    fn test_team_id_rejects_unknown() {
        match "C".parse::<TeamId>() {
            Err(ScoreError::UnknownTeam(name)) => assert_eq!(name, "C"),
            other => panic!("Expected UnknownTeam, got {:?}", other),
        }
        assert!("".parse::<TeamId>().is_err());
        assert!("AB".parse::<TeamId>().is_err());
    }

    #[test]
    fn test_team_id_indices_are_distinct() {
        assert_eq!(TeamId::A.index(), 0);
        assert_eq!(TeamId::B.index(), 1);
    }

    #[test]
    fn test_team_id_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&TeamId::A).unwrap(), r#""A""#);
        let id: TeamId = serde_json::from_str(r#""B""#).unwrap();
        assert_eq!(id, TeamId::B);
    }

    #[test]
    fn test_new_team_uses_default_name() {
        let team = Team::new(TeamId::B);
        assert_eq!(team.name, "Team B");
        assert_eq!(team.total, 0);
    }

    #[test]
    fn test_history_entry_display() {
        let entry = HistoryEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 21, 5, 7).unwrap(),
            team: TeamId::A,
            delta: 10,
            resulting_total: 10,
        };
        assert_eq!(entry.signed_delta(), "+10");
        assert_eq!(entry.display_timestamp(), "2024-03-09 21:05:07");

        let sub = HistoryEntry { delta: -5, ..entry };
        assert_eq!(sub.signed_delta(), "-5");
    }
}
