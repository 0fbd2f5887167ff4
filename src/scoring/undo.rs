use crate::scoring::game::GameState;

/// Game state captured right before a committing action.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoSnapshot {
    pub state: GameState,
    /// Whether the action appended a plate appearance to the event log.
    /// Opponent halves log nothing, so undoing one must not touch the log.
    pub logged_event: bool,
}

/// Stack of snapshots, newest last. Cleared when a game ends or is reset.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    snapshots: Vec<UndoSnapshot>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: &GameState, logged_event: bool) {
        self.snapshots.push(UndoSnapshot {
            state: state.clone(),
            logged_event,
        });
    }

    pub fn pop(&mut self) -> Option<UndoSnapshot> {
        self.snapshots.pop()
    }

    pub fn peek(&self) -> Option<&UndoSnapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Player;
    use crate::scoring::outcome::Role;
    use chrono::NaiveDate;

    fn state(opponent: &str) -> GameState {
        GameState::new(
            NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            opponent,
            Role::Away,
            vec![Player::new("Ava", "Reyes", 3)],
        )
    }

    #[test]
    fn pops_newest_first() {
        let mut stack = UndoStack::new();
        stack.push(&state("A"), true);
        stack.push(&state("B"), false);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek().map(|s| s.logged_event), Some(false));

        let top = stack.pop().unwrap();
        assert_eq!(top.state.opponent, "B");
        assert!(!top.logged_event);
        assert_eq!(stack.pop().unwrap().state.opponent, "A");
        assert!(stack.pop().is_none());
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let mut live = state("A");
        let mut stack = UndoStack::new();
        stack.push(&live, true);
        live.outs = 2;
        live.lineup.push(Player::new("Bo", "Lee", 7));
        let snap = stack.pop().unwrap();
        assert_eq!(snap.state.outs, 0);
        assert_eq!(snap.state.lineup.len(), 1);
    }
}
