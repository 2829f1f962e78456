//! Reversible seat mutations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cinema_core::ShowingId;

use crate::registry::SeatRegistry;
use crate::seat::SeatCode;

/// What a command does to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeatAction {
    SelectOne { seat: SeatCode },
    DeselectOne { seat: SeatCode },
    /// Select several seats as one unit. `applied` holds the seats that were
    /// actually selected by the last execution, in selection order.
    SelectBatch {
        requested: Vec<SeatCode>,
        applied: Vec<SeatCode>,
    },
}

/// A seat mutation that can apply and reverse itself.
///
/// A command is bound to the showing it was built for and refuses to run
/// against any other registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatCommand {
    showing_id: ShowingId,
    action: SeatAction,
    executed: bool,
    executed_at: Option<DateTime<Utc>>,
}

impl SeatCommand {
    fn with_action(showing_id: ShowingId, action: SeatAction) -> Self {
        Self {
            showing_id,
            action,
            executed: false,
            executed_at: None,
        }
    }

    pub fn select(showing_id: ShowingId, seat: SeatCode) -> Self {
        Self::with_action(showing_id, SeatAction::SelectOne { seat })
    }

    pub fn deselect(showing_id: ShowingId, seat: SeatCode) -> Self {
        Self::with_action(showing_id, SeatAction::DeselectOne { seat })
    }

    /// Batch selection. Duplicate codes are kept once, in first-seen order.
    pub fn select_batch(showing_id: ShowingId, seats: impl IntoIterator<Item = SeatCode>) -> Self {
        let mut requested: Vec<SeatCode> = Vec::new();
        for seat in seats {
            if !requested.contains(&seat) {
                requested.push(seat);
            }
        }
        Self::with_action(
            showing_id,
            SeatAction::SelectBatch {
                requested,
                applied: Vec::new(),
            },
        )
    }

    pub fn showing_id(&self) -> ShowingId {
        self.showing_id
    }

    pub fn action(&self) -> &SeatAction {
        &self.action
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Time of the last successful execution.
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    pub fn requested_count(&self) -> usize {
        match &self.action {
            SeatAction::SelectOne { .. } | SeatAction::DeselectOne { .. } => 1,
            SeatAction::SelectBatch { requested, .. } => requested.len(),
        }
    }

    pub fn applied_count(&self) -> usize {
        match &self.action {
            SeatAction::SelectOne { .. } | SeatAction::DeselectOne { .. } => usize::from(self.executed),
            SeatAction::SelectBatch { applied, .. } => applied.len(),
        }
    }

    /// Whether the last execution did everything that was asked.
    pub fn is_fully_applied(&self) -> bool {
        self.executed && self.applied_count() == self.requested_count()
    }

    /// A batch with nothing in it; executing it changes nothing.
    pub fn is_noop(&self) -> bool {
        matches!(&self.action, SeatAction::SelectBatch { requested, .. } if requested.is_empty())
    }

    pub fn description(&self) -> String {
        match &self.action {
            SeatAction::SelectOne { seat } => format!("select seat {seat}"),
            SeatAction::DeselectOne { seat } => format!("deselect seat {seat}"),
            SeatAction::SelectBatch { requested, applied } => {
                let seats = if self.executed { applied } else { requested };
                let list: Vec<String> = seats.iter().map(ToString::to_string).collect();
                format!(
                    "select {} of {} seats [{}]",
                    seats.len(),
                    requested.len(),
                    list.join(", ")
                )
            }
        }
    }

    fn targets(&self, registry: &SeatRegistry) -> bool {
        if registry.showing_id() == self.showing_id {
            return true;
        }
        tracing::warn!(
            command_showing = %self.showing_id,
            registry_showing = %registry.showing_id(),
            "seat command refused: built for another showing"
        );
        false
    }

    /// Run the command. A batch counts as applied when at least one seat was
    /// selected (or nothing was requested).
    pub(crate) fn apply(&mut self, registry: &mut SeatRegistry, now: DateTime<Utc>) -> bool {
        if self.executed || !self.targets(registry) {
            return false;
        }

        let ok = match &mut self.action {
            SeatAction::SelectOne { seat } => registry.select(seat),
            SeatAction::DeselectOne { seat } => registry.deselect(seat),
            SeatAction::SelectBatch { requested, applied } => {
                applied.clear();
                for seat in requested.iter() {
                    if registry.select(seat) {
                        applied.push(*seat);
                    }
                }
                if applied.len() < requested.len() {
                    tracing::debug!(
                        requested = requested.len(),
                        selected = applied.len(),
                        "batch selection partially applied"
                    );
                }
                requested.is_empty() || !applied.is_empty()
            }
        };

        if ok {
            self.executed = true;
            self.executed_at = Some(now);
        }
        ok
    }

    /// Reverse the last execution. A batch releases its seats last-selected
    /// first and only counts as reverted when every one of them was released.
    pub(crate) fn revert(&mut self, registry: &mut SeatRegistry) -> bool {
        if !self.executed || !self.targets(registry) {
            return false;
        }

        let ok = match &self.action {
            SeatAction::SelectOne { seat } => registry.deselect(seat),
            SeatAction::DeselectOne { seat } => registry.select(seat),
            SeatAction::SelectBatch { applied, .. } => {
                let mut released = 0;
                for seat in applied.iter().rev() {
                    if registry.deselect(seat) {
                        released += 1;
                    }
                }
                released == applied.len()
            }
        };

        if ok {
            self.executed = false;
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use crate::seat::SeatStatus;

    fn code(raw: &str) -> SeatCode {
        raw.parse().unwrap()
    }

    fn registry() -> SeatRegistry {
        SeatRegistry::initialize(ShowingId::new(), &LayoutConfig::grid(5, 5, 1_000)).unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn select_command_applies_and_reverts() {
        let mut registry = registry();
        let mut cmd = SeatCommand::select(registry.showing_id(), code("A1"));
        assert!(cmd.executed_at().is_none());

        assert!(cmd.apply(&mut registry, test_time()));
        assert!(cmd.is_executed());
        assert!(cmd.executed_at().is_some());
        assert_eq!(registry.seat(&code("A1")).unwrap().status(), SeatStatus::Selected);

        // Applying twice is refused.
        assert!(!cmd.apply(&mut registry, test_time()));

        assert!(cmd.revert(&mut registry));
        assert!(!cmd.is_executed());
        assert_eq!(registry.seat(&code("A1")).unwrap().status(), SeatStatus::Available);
        assert!(!cmd.revert(&mut registry));
    }

    #[test]
    fn deselect_command_reverts_by_selecting() {
        let mut registry = registry();
        assert!(registry.select(&code("B2")));

        let mut cmd = SeatCommand::deselect(registry.showing_id(), code("B2"));
        assert!(cmd.apply(&mut registry, test_time()));
        assert_eq!(registry.seat(&code("B2")).unwrap().status(), SeatStatus::Available);

        assert!(cmd.revert(&mut registry));
        assert_eq!(registry.seat(&code("B2")).unwrap().status(), SeatStatus::Selected);
    }

    #[test]
    fn batch_records_only_successful_seats() {
        let mut registry = registry();
        assert!(registry.select(&code("A2")));

        let mut cmd = SeatCommand::select_batch(
            registry.showing_id(),
            [code("A1"), code("A2"), code("A3"), code("Z1")],
        );
        assert!(cmd.apply(&mut registry, test_time()));
        assert_eq!(cmd.requested_count(), 4);
        assert_eq!(cmd.applied_count(), 2);
        assert!(!cmd.is_fully_applied());
        assert_eq!(
            cmd.action(),
            &SeatAction::SelectBatch {
                requested: vec![code("A1"), code("A2"), code("A3"), code("Z1")],
                applied: vec![code("A1"), code("A3")],
            }
        );

        assert!(cmd.revert(&mut registry));
        assert_eq!(registry.selected_codes(), vec![code("A2")]);
    }

    #[test]
    fn batch_with_nothing_selectable_fails() {
        let mut registry = registry();
        assert!(registry.select(&code("A1")));
        let mut cmd = SeatCommand::select_batch(registry.showing_id(), [code("A1")]);
        assert!(!cmd.apply(&mut registry, test_time()));
        assert!(!cmd.is_executed());
    }

    #[test]
    fn batch_drops_duplicate_requests() {
        let cmd = SeatCommand::select_batch(ShowingId::new(), [code("C1"), code("C2"), code("C1")]);
        assert_eq!(cmd.requested_count(), 2);
        assert!(SeatCommand::select_batch(ShowingId::new(), []).is_noop());
    }

    #[test]
    fn command_for_another_showing_is_refused() {
        let mut registry = registry();
        let mut cmd = SeatCommand::select(ShowingId::new(), code("A1"));
        assert!(!cmd.apply(&mut registry, test_time()));
        assert_eq!(registry.seat(&code("A1")).unwrap().status(), SeatStatus::Available);
    }

    #[test]
    fn descriptions_name_the_seats() {
        let mut registry = registry();
        let cmd = SeatCommand::select(registry.showing_id(), code("D4"));
        assert_eq!(cmd.description(), "select seat D4");

        let mut batch = SeatCommand::select_batch(registry.showing_id(), [code("A1"), code("A2")]);
        assert_eq!(batch.description(), "select 2 of 2 seats [A1, A2]");
        assert!(registry.select(&code("A2")));
        assert!(batch.apply(&mut registry, test_time()));
        assert_eq!(batch.description(), "select 1 of 2 seats [A1]");
    }
}
