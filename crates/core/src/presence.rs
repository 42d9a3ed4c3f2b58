// Presence Tracking
//
// Holds the player set from the last meaningful poll and turns each new
// snapshot into a join/leave diff.

use crate::snapshot::ServerSnapshot;
use std::collections::HashSet;

/// Who joined and who left between two polls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceDiff {
    pub joined: HashSet<String>,
    pub left: HashSet<String>,
}

impl PresenceDiff {
    /// `joined = current - previous`, `left = previous - current`
    pub fn between(previous: &HashSet<String>, current: &HashSet<String>) -> Self {
        Self {
            joined: current.difference(previous).cloned().collect(),
            left: previous.difference(current).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty()
    }
}

/// What applying a snapshot did to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Snapshot was offline; state untouched
    Offline,
    /// No players now and none tracked; state untouched
    Idle,
    /// Online, same players as before
    Unchanged,
    /// Players joined and/or left
    Changed(PresenceDiff),
}

/// Player set retained between polls.
///
/// Owned by the polling task and handed to each iteration. An offline
/// snapshot never clears it, so a failed fetch cannot look like everyone
/// leaving. A legitimately empty online server does clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceState {
    previous_players: HashSet<String>,
}

impl PresenceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players<I, S>(players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            previous_players: players.into_iter().map(Into::into).collect(),
        }
    }

    pub fn players(&self) -> &HashSet<String> {
        &self.previous_players
    }

    /// Diff `snapshot` against the retained set and advance the state
    pub fn apply(&mut self, snapshot: &ServerSnapshot) -> Transition {
        if !snapshot.is_online {
            return Transition::Offline;
        }

        if snapshot.players.is_empty() && self.previous_players.is_empty() {
            return Transition::Idle;
        }

        let diff = PresenceDiff::between(&self.previous_players, &snapshot.players);

        if !snapshot.players.is_empty() || !self.previous_players.is_empty() {
            self.previous_players = snapshot.players.clone();
        }

        if diff.is_empty() {
            Transition::Unchanged
        } else {
            Transition::Changed(diff)
        }
    }
}
