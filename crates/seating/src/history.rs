//! Undo/redo history of seat commands for one (customer, showing) session.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cinema_core::{DomainError, DomainResult, ShowingId};

use crate::command::SeatCommand;
use crate::registry::SeatRegistry;
use crate::seat::SeatCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Undo depth; the oldest command is forgotten once this is exceeded.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 50 }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.max_entries == 0 {
            return Err(DomainError::validation("history max_entries must be at least 1"));
        }
        Ok(())
    }
}

/// One line of history introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub description: String,
    pub executed_at: Option<DateTime<Utc>>,
}

impl From<&SeatCommand> for HistoryEntry {
    fn from(command: &SeatCommand) -> Self {
        Self {
            description: command.description(),
            executed_at: command.executed_at(),
        }
    }
}

/// Result of a batch selection: how many seats were asked for and how many
/// were actually selected. Under-fulfilment is for the caller to judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub requested: usize,
    pub selected: usize,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.requested == self.selected
    }
}

/// Linear undo/redo over seat commands.
///
/// Executing a new command forks history: the redo stack is discarded.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    showing_id: ShowingId,
    config: HistoryConfig,
    undo: VecDeque<SeatCommand>,
    redo: Vec<SeatCommand>,
}

impl CommandHistory {
    pub fn new(showing_id: ShowingId, config: HistoryConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self {
            showing_id,
            config,
            undo: VecDeque::new(),
            redo: Vec::new(),
        })
    }

    /// History for the showing of `registry`, default depth.
    pub fn for_registry(registry: &SeatRegistry) -> Self {
        Self {
            showing_id: registry.showing_id(),
            config: HistoryConfig::default(),
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    pub fn showing_id(&self) -> ShowingId {
        self.showing_id
    }

    fn accepts(&self, command: &SeatCommand, registry: &SeatRegistry) -> bool {
        if command.showing_id() == self.showing_id && registry.showing_id() == self.showing_id {
            return true;
        }
        tracing::warn!(
            history_showing = %self.showing_id,
            command_showing = %command.showing_id(),
            registry_showing = %registry.showing_id(),
            "command refused: showing mismatch"
        );
        false
    }

    fn push_undo(&mut self, command: SeatCommand) {
        self.undo.push_back(command);
        while self.undo.len() > self.config.max_entries {
            if let Some(evicted) = self.undo.pop_front() {
                tracing::debug!(command = %evicted.description(), "oldest history entry evicted");
            }
        }
    }

    /// Run `command` once. On success it becomes the newest undo entry and
    /// the redo stack is cleared; on failure it is discarded.
    ///
    /// An empty batch is a no-op that reports success and leaves history alone.
    pub fn execute(&mut self, registry: &mut SeatRegistry, mut command: SeatCommand) -> bool {
        if !self.accepts(&command, registry) {
            return false;
        }
        if command.is_noop() {
            return true;
        }
        if !command.apply(registry, Utc::now()) {
            tracing::debug!(command = %command.description(), "command failed, not recorded");
            return false;
        }

        tracing::debug!(command = %command.description(), "command executed");
        self.redo.clear();
        self.push_undo(command);
        true
    }

    /// Reverse the newest command. A command whose reversal fails is dropped.
    pub fn undo(&mut self, registry: &mut SeatRegistry) -> bool {
        let Some(mut command) = self.undo.pop_back() else {
            return false;
        };
        if !self.accepts(&command, registry) {
            self.undo.push_back(command);
            return false;
        }
        if !command.revert(registry) {
            tracing::warn!(command = %command.description(), "undo failed, command dropped");
            return false;
        }

        tracing::debug!(command = %command.description(), "command undone");
        self.redo.push(command);
        true
    }

    /// Re-apply the newest undone command. A command that fails to re-apply is dropped.
    pub fn redo(&mut self, registry: &mut SeatRegistry) -> bool {
        let Some(mut command) = self.redo.pop() else {
            return false;
        };
        if !self.accepts(&command, registry) {
            self.redo.push(command);
            return false;
        }
        if !command.apply(registry, Utc::now()) {
            tracing::warn!(command = %command.description(), "redo failed, command dropped");
            return false;
        }

        tracing::debug!(command = %command.description(), "command redone");
        self.push_undo(command);
        true
    }

    pub fn select_seat(&mut self, registry: &mut SeatRegistry, seat: SeatCode) -> bool {
        let command = SeatCommand::select(self.showing_id, seat);
        self.execute(registry, command)
    }

    pub fn deselect_seat(&mut self, registry: &mut SeatRegistry, seat: SeatCode) -> bool {
        let command = SeatCommand::deselect(self.showing_id, seat);
        self.execute(registry, command)
    }

    /// Select several seats as one undoable unit.
    pub fn select_seats(
        &mut self,
        registry: &mut SeatRegistry,
        seats: impl IntoIterator<Item = SeatCode>,
    ) -> BatchOutcome {
        let command = SeatCommand::select_batch(self.showing_id, seats);
        let requested = command.requested_count();
        let selected = if requested > 0 && self.execute(registry, command) {
            self.last_executed().map_or(0, SeatCommand::applied_count)
        } else {
            0
        };
        BatchOutcome { requested, selected }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn last_executed(&self) -> Option<&SeatCommand> {
        self.undo.back()
    }

    /// Undoable commands, most recent first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.undo.iter().rev().map(HistoryEntry::from).collect()
    }

    /// Redoable commands, next redo first.
    pub fn redo_entries(&self) -> Vec<HistoryEntry> {
        self.redo.iter().rev().map(HistoryEntry::from).collect()
    }

    /// Forget all history. Seat statuses are left as they are.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
