//! Per-region scoring state machine.
//!
//! ```text
//! Playing --(score reaches threshold)--> Won --(reset)--> Playing
//! ```
//!
//! While the session is [`SessionState::Won`] every score change is
//! rejected with [`ScoreOutcome::Locked`]. Win credits are kept in a
//! separate counter that survives resets and is persisted with the region.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::PlayerId;

/// Phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Scores are accepted.
    #[default]
    Playing,
    /// A player reached the threshold; scores are locked until reset.
    Won {
        /// Player who won
        winner: PlayerId,
    },
}

/// Result of a score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// The game is already won; nothing changed.
    Locked,
    /// The score was added.
    Scored {
        /// Score after the change
        score: u32,
    },
    /// The score was added and won the game.
    Won {
        /// Winning score
        score: u32,
        /// Winner's win count including this game
        total_wins: u32,
    },
}

/// Scores and win state of one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    scores: BTreeMap<PlayerId, u32>,
    state: SessionState,
    win_threshold: u32,
    wins: BTreeMap<PlayerId, u32>,
}

impl GameSession {
    /// Creates an empty session that is won at `win_threshold` points.
    #[must_use]
    pub fn new(win_threshold: u32) -> Self {
        Self {
            scores: BTreeMap::new(),
            state: SessionState::Playing,
            win_threshold: win_threshold.max(1),
            wins: BTreeMap::new(),
        }
    }

    /// Starts tracking a player at zero, keeping an existing score.
    pub fn add_player(&mut self, player: PlayerId) {
        self.scores.entry(player).or_insert(0);
    }

    /// Stops tracking a player's score. Win credits are kept.
    pub fn remove_player(&mut self, player: PlayerId) {
        self.scores.remove(&player);
    }

    /// Adds one basket for `player`.
    pub fn add_score(&mut self, player: PlayerId) -> ScoreOutcome {
        self.add_points(player, 1)
    }

    /// Adds `points` for `player` and checks for a win.
    pub fn add_points(&mut self, player: PlayerId, points: u32) -> ScoreOutcome {
        if self.is_won() {
            return ScoreOutcome::Locked;
        }

        let entry = self.scores.entry(player).or_insert(0);
        *entry = entry.saturating_add(points);
        let score = *entry;

        if score < self.win_threshold {
            return ScoreOutcome::Scored { score };
        }

        self.state = SessionState::Won { winner: player };
        let wins = self.wins.entry(player).or_insert(0);
        *wins += 1;
        ScoreOutcome::Won {
            score,
            total_wins: *wins,
        }
    }

    /// Clears the won state and zeroes the scores of `present` players.
    ///
    /// Players not in `present` are forgotten.
    pub fn reset(&mut self, present: impl IntoIterator<Item = PlayerId>) {
        self.scores = present.into_iter().map(|player| (player, 0)).collect();
        self.state = SessionState::Playing;
    }

    /// Current phase.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true while scores are locked.
    #[must_use]
    pub const fn is_won(&self) -> bool {
        matches!(self.state, SessionState::Won { .. })
    }

    /// Score of `player`, zero if untracked.
    #[must_use]
    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores.get(&player).copied().unwrap_or(0)
    }

    /// All tracked scores in player order.
    #[must_use]
    pub const fn scores(&self) -> &BTreeMap<PlayerId, u32> {
        &self.scores
    }

    /// Win credits of `player`.
    #[must_use]
    pub fn wins(&self, player: PlayerId) -> u32 {
        self.wins.get(&player).copied().unwrap_or(0)
    }

    /// All win credits.
    #[must_use]
    pub const fn all_wins(&self) -> &BTreeMap<PlayerId, u32> {
        &self.wins
    }

    /// Replaces the win credits, typically with persisted counts.
    pub fn set_wins(&mut self, wins: BTreeMap<PlayerId, u32>) {
        self.wins = wins;
    }

    /// Score that wins a game.
    #[must_use]
    pub const fn win_threshold(&self) -> u32 {
        self.win_threshold
    }

    /// Changes the threshold for subsequent score changes.
    pub fn set_win_threshold(&mut self, threshold: u32) {
        self.win_threshold = threshold.max(1);
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(10)
    }
}
