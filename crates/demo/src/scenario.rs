//! One customer books seats for one showing, start to finish.

use anyhow::{Context, bail};
use serde::Serialize;
use uuid::Uuid;

use cinema_booking::{Booking, BookingSnapshot, TransitionOutcome};
use cinema_core::{BookingId, CustomerId, ShowingId};
use cinema_seating::{CommandHistory, HistoryEntry, RegistrySnapshot, SeatCode, SeatRegistry};

use crate::config::DemoConfig;

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// What happened, in order.
    pub steps: Vec<String>,
    pub history: Vec<HistoryEntry>,
    pub registry: RegistrySnapshot,
    pub booking: BookingSnapshot,
}

fn describe(outcome: &TransitionOutcome) -> String {
    match outcome {
        TransitionOutcome::Applied(t) if t.changes_state() => format!("{} -> {}", t.from, t.to),
        TransitionOutcome::Applied(_) => "updated".to_string(),
        TransitionOutcome::Ignored(reason) => format!("ignored: {reason}"),
    }
}

/// Select three seats (one alone, two as a batch) with some undo/redo along
/// the way, then carry them through a booking until it is completed.
pub fn run_scenario(config: &DemoConfig) -> anyhow::Result<ScenarioReport> {
    let showing_id = ShowingId::new();
    let mut registry =
        SeatRegistry::initialize(showing_id, &config.layout).context("building seat registry")?;
    let mut history = CommandHistory::new(showing_id, config.history.clone())
        .context("building command history")?;
    let mut steps = Vec::new();

    let picks: Vec<SeatCode> = registry
        .available_seats()
        .iter()
        .take(3)
        .map(|seat| seat.code())
        .collect();
    let [single, pair @ ..] = picks.as_slice() else {
        bail!("no seat available");
    };
    if pair.len() < 2 {
        bail!("need three available seats, found {}", picks.len());
    }

    let selected = history.select_seat(&mut registry, *single);
    steps.push(format!("select {single}: {selected}"));

    let batch = history.select_seats(&mut registry, pair.iter().copied());
    steps.push(format!(
        "select batch: {} of {} seats",
        batch.selected, batch.requested
    ));

    let undone = history.undo(&mut registry);
    steps.push(format!("undo batch: {undone}"));
    let redone = history.redo(&mut registry);
    steps.push(format!("redo batch: {redone}"));

    let deselected = history.deselect_seat(&mut registry, *single);
    steps.push(format!("deselect {single}: {deselected}"));
    let undone = history.undo(&mut registry);
    steps.push(format!("undo deselect: {undone}"));

    let codes = registry.selected_codes();
    if codes.len() != picks.len() {
        bail!(
            "expected {} selected seats, registry holds {}",
            picks.len(),
            codes.len()
        );
    }

    let mut booking = Booking::new(BookingId::new(), CustomerId::new())
        .with_refund_policy(config.refunds)
        .context("applying refund policy")?;
    for seat in registry.selected_seats() {
        let outcome = booking.add_seat(seat);
        steps.push(format!("add {} ({}): {}", seat.code(), seat.price(), describe(&outcome)));
    }

    let outcome = booking.proceed_to_payment();
    steps.push(format!("proceed to payment: {}", describe(&outcome)));

    let total = booking.total();
    let outcome = booking.pay(total.saturating_sub(1));
    steps.push(format!("pay {}: {}", total.saturating_sub(1), describe(&outcome)));

    let transaction_ref = format!("TXN-{}", Uuid::now_v7().simple());
    let outcome = booking.pay_with_reference(total, transaction_ref);
    steps.push(format!("pay {total}: {}", describe(&outcome)));
    if !outcome.is_applied() {
        bail!("payment of {total} was not accepted");
    }

    if !registry.confirm(&codes) {
        bail!("seats {codes:?} could not be booked");
    }
    steps.push(format!("book {} seats in the hall", codes.len()));

    let outcome = booking.confirm();
    steps.push(format!("confirm: {}", describe(&outcome)));
    let outcome = booking.complete();
    steps.push(format!("complete: {}", describe(&outcome)));
    let outcome = booking.cancel();
    steps.push(format!("cancel: {}", describe(&outcome)));

    tracing::info!(
        showing_id = %showing_id,
        booking_id = %booking.booking_id(),
        total,
        state = %booking.state(),
        "scenario finished"
    );

    Ok(ScenarioReport {
        steps,
        history: history.entries(),
        registry: registry.snapshot(),
        booking: booking.snapshot(),
    })
}
