//! Booking lifecycle as a pure transition function.
//!
//! | From      | Event               | To        |
//! |-----------|---------------------|-----------|
//! | Draft     | add line item       | Draft     |
//! | Draft     | proceed to payment  | Pending   |
//! | Draft     | cancel              | Cancelled |
//! | Pending   | pay (>= total)      | Paid      |
//! | Pending   | cancel              | Cancelled |
//! | Paid      | confirm             | Confirmed |
//! | Paid      | refund (full)       | Cancelled |
//! | Confirmed | complete            | Completed |
//! | Confirmed | refund (partial)    | Cancelled |
//!
//! `Completed` and `Cancelled` accept nothing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cinema_core::{DomainError, DomainResult};
use cinema_seating::SeatCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingState {
    Draft,
    Pending,
    Paid,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Draft => "draft",
            BookingState::Pending => "pending",
            BookingState::Paid => "paid",
            BookingState::Confirmed => "confirmed",
            BookingState::Completed => "completed",
            BookingState::Cancelled => "cancelled",
        }
    }

    /// Line items can only change while the booking is a draft.
    pub fn is_modifiable(&self) -> bool {
        matches!(self, BookingState::Draft)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingState::Completed | BookingState::Cancelled)
    }
}

impl core::fmt::Display for BookingState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happens to a booking, with its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A line item was priced; `total_after` is the running total including it.
    AddLineItem { total_after: u64 },
    ProceedToPayment,
    Pay { amount: u64 },
    Confirm,
    Complete,
    Cancel,
    Refund,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::AddLineItem { .. } => "add line item",
            LifecycleEvent::ProceedToPayment => "proceed to payment",
            LifecycleEvent::Pay { .. } => "pay",
            LifecycleEvent::Confirm => "confirm",
            LifecycleEvent::Complete => "complete",
            LifecycleEvent::Cancel => "cancel",
            LifecycleEvent::Refund => "refund",
        }
    }
}

/// The parts of a booking the guards look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionContext {
    pub line_items: usize,
    pub total: u64,
    pub paid: u64,
}

/// Refund percentages by the state the booking is refunded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundPolicy {
    pub from_paid_percent: u8,
    pub from_confirmed_percent: u8,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            from_paid_percent: 100,
            from_confirmed_percent: 80,
        }
    }
}

impl RefundPolicy {
    pub fn validate(&self) -> DomainResult<()> {
        if self.from_paid_percent > 100 || self.from_confirmed_percent > 100 {
            return Err(DomainError::validation("refund percent cannot exceed 100"));
        }
        Ok(())
    }

    /// Amount returned when a booking in `state` that took `paid` is refunded.
    pub fn refund_for(&self, state: BookingState, paid: u64) -> u64 {
        let percent = match state {
            BookingState::Paid => self.from_paid_percent,
            BookingState::Confirmed => self.from_confirmed_percent,
            _ => 0,
        };
        let percent = u128::from(percent.min(100));
        // At most 100% of `paid`, so the quotient always fits.
        u64::try_from(u128::from(paid) * percent / 100).unwrap_or(paid)
    }
}

/// Side effect carried by an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    None,
    TotalChanged { total: u64 },
    PaymentRecorded { amount: u64 },
    RefundIssued { amount: u64 },
}

impl Effect {
    pub fn refund_amount(&self) -> u64 {
        match self {
            Effect::RefundIssued { amount } => *amount,
            _ => 0,
        }
    }
}

/// An accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: BookingState,
    pub to: BookingState,
    pub effect: Effect,
}

impl Transition {
    pub fn changes_state(&self) -> bool {
        self.from != self.to
    }
}

/// Why an event was ignored. Nothing was mutated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("booking is {state}; no further changes are accepted")]
    Finished { state: BookingState },

    #[error("cannot {event} a booking that is {state}")]
    NotAllowed {
        state: BookingState,
        event: &'static str,
    },

    #[error("booking has no line items")]
    EmptyBooking,

    #[error("payment of {offered} does not cover the total of {due}")]
    InsufficientPayment { offered: u64, due: u64 },

    #[error("running total cannot drop from {current} to {proposed}")]
    TotalWouldDecrease { current: u64, proposed: u64 },

    #[error("seat {0} is already on this booking")]
    DuplicateSeat(SeatCode),

    #[error("running total would exceed the largest representable amount")]
    TotalOverflow,
}

/// Decide the outcome of `event` for a booking in `state`.
///
/// Pure: the caller applies the returned transition.
pub fn transition(
    state: BookingState,
    event: &LifecycleEvent,
    ctx: &TransitionContext,
    refunds: &RefundPolicy,
) -> Result<Transition, Rejection> {
    use BookingState::*;

    if state.is_terminal() {
        return Err(Rejection::Finished { state });
    }

    let accept = |to: BookingState, effect: Effect| -> Result<Transition, Rejection> {
        Ok(Transition {
            from: state,
            to,
            effect,
        })
    };

    match (state, *event) {
        (Draft, LifecycleEvent::AddLineItem { total_after }) => {
            if total_after < ctx.total {
                return Err(Rejection::TotalWouldDecrease {
                    current: ctx.total,
                    proposed: total_after,
                });
            }
            accept(Draft, Effect::TotalChanged { total: total_after })
        }
        (Draft, LifecycleEvent::ProceedToPayment) => {
            if ctx.line_items == 0 {
                return Err(Rejection::EmptyBooking);
            }
            accept(Pending, Effect::None)
        }
        (Draft | Pending, LifecycleEvent::Cancel) => accept(Cancelled, Effect::None),
        (Pending, LifecycleEvent::Pay { amount }) => {
            if amount < ctx.total {
                return Err(Rejection::InsufficientPayment {
                    offered: amount,
                    due: ctx.total,
                });
            }
            accept(Paid, Effect::PaymentRecorded { amount })
        }
        (Paid, LifecycleEvent::Confirm) => accept(Confirmed, Effect::None),
        (Paid | Confirmed, LifecycleEvent::Refund) => accept(
            Cancelled,
            Effect::RefundIssued {
                amount: refunds.refund_for(state, ctx.paid),
            },
        ),
        (Confirmed, LifecycleEvent::Complete) => accept(Completed, Effect::None),
        (_, event) => Err(Rejection::NotAllowed {
            state,
            event: event.name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL_STATES: [BookingState; 6] = [
        BookingState::Draft,
        BookingState::Pending,
        BookingState::Paid,
        BookingState::Confirmed,
        BookingState::Completed,
        BookingState::Cancelled,
    ];

    fn ctx(line_items: usize, total: u64, paid: u64) -> TransitionContext {
        TransitionContext {
            line_items,
            total,
            paid,
        }
    }

    fn step(state: BookingState, event: LifecycleEvent, ctx: TransitionContext) -> Result<Transition, Rejection> {
        transition(state, &event, &ctx, &RefundPolicy::default())
    }

    #[test]
    fn happy_path_walks_every_state() {
        let c = ctx(1, 50_000, 0);
        let t = step(BookingState::Draft, LifecycleEvent::ProceedToPayment, c).unwrap();
        assert_eq!(t.to, BookingState::Pending);

        let t = step(BookingState::Pending, LifecycleEvent::Pay { amount: 50_000 }, c).unwrap();
        assert_eq!(t.to, BookingState::Paid);
        assert_eq!(t.effect, Effect::PaymentRecorded { amount: 50_000 });

        let t = step(BookingState::Paid, LifecycleEvent::Confirm, c).unwrap();
        assert_eq!(t.to, BookingState::Confirmed);

        let t = step(BookingState::Confirmed, LifecycleEvent::Complete, c).unwrap();
        assert_eq!(t.to, BookingState::Completed);
    }

    #[test]
    fn proceeding_needs_a_line_item() {
        assert_eq!(
            step(BookingState::Draft, LifecycleEvent::ProceedToPayment, ctx(0, 0, 0)),
            Err(Rejection::EmptyBooking)
        );
    }

    #[test]
    fn underpayment_is_refused() {
        assert_eq!(
            step(BookingState::Pending, LifecycleEvent::Pay { amount: 40_000 }, ctx(1, 50_000, 0)),
            Err(Rejection::InsufficientPayment {
                offered: 40_000,
                due: 50_000
            })
        );
    }

    #[test]
    fn refund_amount_depends_on_state() {
        let c = ctx(1, 50_000, 50_000);
        let from_paid = step(BookingState::Paid, LifecycleEvent::Refund, c).unwrap();
        assert_eq!(from_paid.to, BookingState::Cancelled);
        assert_eq!(from_paid.effect, Effect::RefundIssued { amount: 50_000 });

        let from_confirmed = step(BookingState::Confirmed, LifecycleEvent::Refund, c).unwrap();
        assert_eq!(from_confirmed.effect, Effect::RefundIssued { amount: 40_000 });
    }

    #[test]
    fn cancel_only_before_payment() {
        for state in [BookingState::Draft, BookingState::Pending] {
            let t = step(state, LifecycleEvent::Cancel, ctx(1, 10, 0)).unwrap();
            assert_eq!(t.to, BookingState::Cancelled);
        }
        for state in [BookingState::Paid, BookingState::Confirmed] {
            assert_eq!(
                step(state, LifecycleEvent::Cancel, ctx(1, 10, 10)),
                Err(Rejection::NotAllowed {
                    state,
                    event: "cancel"
                })
            );
        }
    }

    #[test]
    fn line_items_only_in_draft_and_total_never_drops() {
        let t = step(BookingState::Draft, LifecycleEvent::AddLineItem { total_after: 150 }, ctx(1, 100, 0)).unwrap();
        assert!(!t.changes_state());
        assert_eq!(t.effect, Effect::TotalChanged { total: 150 });

        assert_eq!(
            step(BookingState::Draft, LifecycleEvent::AddLineItem { total_after: 90 }, ctx(1, 100, 0)),
            Err(Rejection::TotalWouldDecrease {
                current: 100,
                proposed: 90
            })
        );
        assert!(step(BookingState::Pending, LifecycleEvent::AddLineItem { total_after: 150 }, ctx(1, 100, 0)).is_err());
    }

    #[test]
    fn custom_refund_policy_is_validated() {
        let policy = RefundPolicy {
            from_paid_percent: 101,
            ..RefundPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = RefundPolicy {
            from_paid_percent: 90,
            from_confirmed_percent: 50,
        };
        assert_eq!(policy.refund_for(BookingState::Paid, 1_000), 900);
        assert_eq!(policy.refund_for(BookingState::Confirmed, 1_000), 500);
        assert_eq!(policy.refund_for(BookingState::Pending, 1_000), 0);
    }

    #[test]
    fn refunds_do_not_lose_precision_near_the_top_of_the_range() {
        let policy = RefundPolicy::default();
        assert_eq!(policy.refund_for(BookingState::Paid, u64::MAX), u64::MAX);
        assert_eq!(
            policy.refund_for(BookingState::Confirmed, u64::MAX / 10),
            1_475_739_525_896_764_128
        );
    }

    fn any_event() -> impl Strategy<Value = LifecycleEvent> {
        prop_oneof![
            any::<u64>().prop_map(|total_after| LifecycleEvent::AddLineItem { total_after }),
            Just(LifecycleEvent::ProceedToPayment),
            any::<u64>().prop_map(|amount| LifecycleEvent::Pay { amount }),
            Just(LifecycleEvent::Confirm),
            Just(LifecycleEvent::Complete),
            Just(LifecycleEvent::Cancel),
            Just(LifecycleEvent::Refund),
        ]
    }

    proptest! {
        /// Property: terminal states accept no event.
        #[test]
        fn terminal_states_are_absorbing(event in any_event(), total in any::<u64>(), paid in any::<u64>()) {
            for state in [BookingState::Completed, BookingState::Cancelled] {
                prop_assert_eq!(
                    step(state, event, ctx(1, total, paid)),
                    Err(Rejection::Finished { state })
                );
            }
        }

        /// Property: an accepted transition starts from the given state, and
        /// only the draft state stays put.
        #[test]
        fn accepted_transitions_are_consistent(
            idx in 0usize..6,
            event in any_event(),
            total in 0u64..1_000_000,
            paid in 0u64..1_000_000,
        ) {
            let state = ALL_STATES[idx];
            if let Ok(t) = step(state, event, ctx(1, total, paid)) {
                prop_assert_eq!(t.from, state);
                prop_assert!(t.changes_state() || state == BookingState::Draft);
                if let Effect::RefundIssued { amount } = t.effect {
                    prop_assert!(amount <= paid);
                }
            }
        }
    }
}
