use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cinema_core::{Aggregate, AggregateRoot, BookingId, CustomerId, DomainResult, Event};
use cinema_seating::Seat;

use crate::lifecycle::{
    BookingState, LifecycleEvent, RefundPolicy, Rejection, Transition, TransitionContext,
    transition,
};
use crate::line_item::{LineItem, LineItemSum, TotalCalculator};

/// One entry of a booking's state log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: BookingState,
    pub to: BookingState,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCommand {
    AddLineItem {
        item: LineItem,
        occurred_at: DateTime<Utc>,
    },
    ProceedToPayment {
        occurred_at: DateTime<Utc>,
    },
    Pay {
        amount: u64,
        transaction_ref: Option<String>,
        occurred_at: DateTime<Utc>,
    },
    Confirm {
        occurred_at: DateTime<Utc>,
    },
    Complete {
        occurred_at: DateTime<Utc>,
    },
    Cancel {
        occurred_at: DateTime<Utc>,
    },
    Refund {
        occurred_at: DateTime<Utc>,
    },
}

impl BookingCommand {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BookingCommand::AddLineItem { occurred_at, .. }
            | BookingCommand::ProceedToPayment { occurred_at }
            | BookingCommand::Pay { occurred_at, .. }
            | BookingCommand::Confirm { occurred_at }
            | BookingCommand::Complete { occurred_at }
            | BookingCommand::Cancel { occurred_at }
            | BookingCommand::Refund { occurred_at } => *occurred_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    LineItemAdded {
        item: LineItem,
        /// Running total after the item.
        total: u64,
        occurred_at: DateTime<Utc>,
    },
    PaymentRequested {
        occurred_at: DateTime<Utc>,
    },
    PaymentReceived {
        amount: u64,
        transaction_ref: Option<String>,
        occurred_at: DateTime<Utc>,
    },
    BookingConfirmed {
        occurred_at: DateTime<Utc>,
    },
    BookingCompleted {
        occurred_at: DateTime<Utc>,
    },
    BookingCancelled {
        from: BookingState,
        refund_amount: u64,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::LineItemAdded { .. } => "booking.line_item_added",
            BookingEvent::PaymentRequested { .. } => "booking.payment_requested",
            BookingEvent::PaymentReceived { .. } => "booking.payment_received",
            BookingEvent::BookingConfirmed { .. } => "booking.confirmed",
            BookingEvent::BookingCompleted { .. } => "booking.completed",
            BookingEvent::BookingCancelled { .. } => "booking.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BookingEvent::LineItemAdded { occurred_at, .. }
            | BookingEvent::PaymentRequested { occurred_at }
            | BookingEvent::PaymentReceived { occurred_at, .. }
            | BookingEvent::BookingConfirmed { occurred_at }
            | BookingEvent::BookingCompleted { occurred_at }
            | BookingEvent::BookingCancelled { occurred_at, .. } => *occurred_at,
        }
    }
}

/// What became of a command sent to a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied(Transition),
    /// The booking did not accept the command and is unchanged.
    Ignored(Rejection),
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }

    pub fn transition(&self) -> Option<&Transition> {
        match self {
            TransitionOutcome::Applied(t) => Some(t),
            TransitionOutcome::Ignored(_) => None,
        }
    }

    /// Human-readable reason when the command was ignored.
    pub fn reason(&self) -> Option<String> {
        match self {
            TransitionOutcome::Applied(_) => None,
            TransitionOutcome::Ignored(rejection) => Some(rejection.to_string()),
        }
    }
}

/// Aggregate root: Booking.
///
/// Owned by one caller at a time; a host with several writers must serialise
/// access per booking.
#[derive(Debug, Clone)]
pub struct Booking {
    id: BookingId,
    customer_id: CustomerId,
    state: BookingState,
    line_items: Vec<LineItem>,
    total: u64,
    paid_amount: u64,
    refunded_amount: u64,
    transaction_ref: Option<String>,
    transitions: Vec<StateTransition>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    version: u64,
    calculator: Arc<dyn TotalCalculator>,
    refund_policy: RefundPolicy,
}

impl Booking {
    pub fn new(id: BookingId, customer_id: CustomerId) -> Self {
        Self::new_at(id, customer_id, Utc::now())
    }

    /// A fresh draft created at `at`.
    pub fn new_at(id: BookingId, customer_id: CustomerId, at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id,
            state: BookingState::Draft,
            line_items: Vec::new(),
            total: 0,
            paid_amount: 0,
            refunded_amount: 0,
            transaction_ref: None,
            transitions: Vec::new(),
            created_at: at,
            last_modified: at,
            version: 0,
            calculator: Arc::new(LineItemSum),
            refund_policy: RefundPolicy::default(),
        }
    }

    /// Replace the total calculator. Meant to be called before any line item is added.
    pub fn with_calculator(mut self, calculator: Arc<dyn TotalCalculator>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_refund_policy(mut self, policy: RefundPolicy) -> DomainResult<Self> {
        policy.validate()?;
        self.refund_policy = policy;
        Ok(self)
    }

    pub fn booking_id(&self) -> BookingId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn state(&self) -> BookingState {
        self.state
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn paid_amount(&self) -> u64 {
        self.paid_amount
    }

    pub fn refunded_amount(&self) -> u64 {
        self.refunded_amount
    }

    pub fn transaction_ref(&self) -> Option<&str> {
        self.transaction_ref.as_deref()
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn is_modifiable(&self) -> bool {
        self.state.is_modifiable()
    }

    fn context(&self) -> TransitionContext {
        TransitionContext {
            line_items: self.line_items.len(),
            total: self.total,
            paid: self.paid_amount,
        }
    }

    /// Run the lifecycle guard for `command` and build the event it produces.
    fn decide(&self, command: &BookingCommand) -> Result<(Transition, BookingEvent), Rejection> {
        let occurred_at = command.occurred_at();
        let mut total_after = self.total;

        let lifecycle_event = match command {
            BookingCommand::AddLineItem { item, .. } => {
                if self.state.is_modifiable() {
                    if self.line_items.iter().any(|existing| existing.seat == item.seat) {
                        return Err(Rejection::DuplicateSeat(item.seat));
                    }
                    let mut items = self.line_items.clone();
                    items.push(item.clone());
                    total_after = self
                        .calculator
                        .total(&items)
                        .ok_or(Rejection::TotalOverflow)?;
                }
                LifecycleEvent::AddLineItem { total_after }
            }
            BookingCommand::ProceedToPayment { .. } => LifecycleEvent::ProceedToPayment,
            BookingCommand::Pay { amount, .. } => LifecycleEvent::Pay { amount: *amount },
            BookingCommand::Confirm { .. } => LifecycleEvent::Confirm,
            BookingCommand::Complete { .. } => LifecycleEvent::Complete,
            BookingCommand::Cancel { .. } => LifecycleEvent::Cancel,
            BookingCommand::Refund { .. } => LifecycleEvent::Refund,
        };

        let accepted = transition(
            self.state,
            &lifecycle_event,
            &self.context(),
            &self.refund_policy,
        )?;

        let event = match command {
            BookingCommand::AddLineItem { item, .. } => BookingEvent::LineItemAdded {
                item: item.clone(),
                total: total_after,
                occurred_at,
            },
            BookingCommand::ProceedToPayment { .. } => BookingEvent::PaymentRequested { occurred_at },
            BookingCommand::Pay {
                amount,
                transaction_ref,
                ..
            } => BookingEvent::PaymentReceived {
                amount: *amount,
                transaction_ref: transaction_ref.clone(),
                occurred_at,
            },
            BookingCommand::Confirm { .. } => BookingEvent::BookingConfirmed { occurred_at },
            BookingCommand::Complete { .. } => BookingEvent::BookingCompleted { occurred_at },
            BookingCommand::Cancel { .. } | BookingCommand::Refund { .. } => {
                BookingEvent::BookingCancelled {
                    from: accepted.from,
                    refund_amount: accepted.effect.refund_amount(),
                    occurred_at,
                }
            }
        };

        Ok((accepted, event))
    }

    /// Decide and apply `command`. Refused commands leave the booking untouched.
    pub fn execute(&mut self, command: BookingCommand) -> TransitionOutcome {
        match self.decide(&command) {
            Ok((accepted, event)) => {
                self.apply(&event);
                if accepted.changes_state() {
                    tracing::info!(
                        booking_id = %self.id,
                        from = %accepted.from,
                        to = %accepted.to,
                        event = event.event_type(),
                        "booking state changed"
                    );
                } else {
                    tracing::debug!(
                        booking_id = %self.id,
                        event = event.event_type(),
                        total = self.total,
                        "booking updated"
                    );
                }
                TransitionOutcome::Applied(accepted)
            }
            Err(rejection) => {
                tracing::debug!(
                    booking_id = %self.id,
                    state = %self.state,
                    reason = %rejection,
                    "booking command ignored"
                );
                TransitionOutcome::Ignored(rejection)
            }
        }
    }

    pub fn add_line_item(&mut self, item: LineItem) -> TransitionOutcome {
        self.execute(BookingCommand::AddLineItem {
            item,
            occurred_at: Utc::now(),
        })
    }

    pub fn add_seat(&mut self, seat: &Seat) -> TransitionOutcome {
        self.add_line_item(LineItem::from(seat))
    }

    pub fn proceed_to_payment(&mut self) -> TransitionOutcome {
        self.execute(BookingCommand::ProceedToPayment {
            occurred_at: Utc::now(),
        })
    }

    pub fn pay(&mut self, amount: u64) -> TransitionOutcome {
        self.execute(BookingCommand::Pay {
            amount,
            transaction_ref: None,
            occurred_at: Utc::now(),
        })
    }

    pub fn pay_with_reference(
        &mut self,
        amount: u64,
        transaction_ref: impl Into<String>,
    ) -> TransitionOutcome {
        self.execute(BookingCommand::Pay {
            amount,
            transaction_ref: Some(transaction_ref.into()),
            occurred_at: Utc::now(),
        })
    }

    pub fn confirm(&mut self) -> TransitionOutcome {
        self.execute(BookingCommand::Confirm {
            occurred_at: Utc::now(),
        })
    }

    pub fn complete(&mut self) -> TransitionOutcome {
        self.execute(BookingCommand::Complete {
            occurred_at: Utc::now(),
        })
    }

    pub fn cancel(&mut self) -> TransitionOutcome {
        self.execute(BookingCommand::Cancel {
            occurred_at: Utc::now(),
        })
    }

    pub fn refund(&mut self) -> TransitionOutcome {
        self.execute(BookingCommand::Refund {
            occurred_at: Utc::now(),
        })
    }

    pub fn snapshot(&self) -> BookingSnapshot {
        BookingSnapshot {
            id: self.id,
            customer_id: self.customer_id,
            state: self.state,
            line_items: self.line_items.clone(),
            total: self.total,
            paid_amount: self.paid_amount,
            refunded_amount: self.refunded_amount,
            transaction_ref: self.transaction_ref.clone(),
            transitions: self.transitions.clone(),
            created_at: self.created_at,
            last_modified: self.last_modified,
            version: self.version,
        }
    }
}

impl AggregateRoot for Booking {
    type Id = BookingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Booking {
    type Command = BookingCommand;
    type Event = BookingEvent;
    type Error = Rejection;

    fn apply(&mut self, event: &Self::Event) {
        let from = self.state;

        match event {
            BookingEvent::LineItemAdded { item, total, .. } => {
                self.line_items.push(item.clone());
                self.total = *total;
            }
            BookingEvent::PaymentRequested { .. } => {
                self.state = BookingState::Pending;
            }
            BookingEvent::PaymentReceived {
                amount,
                transaction_ref,
                ..
            } => {
                self.state = BookingState::Paid;
                self.paid_amount = *amount;
                self.transaction_ref = transaction_ref.clone();
            }
            BookingEvent::BookingConfirmed { .. } => {
                self.state = BookingState::Confirmed;
            }
            BookingEvent::BookingCompleted { .. } => {
                self.state = BookingState::Completed;
            }
            BookingEvent::BookingCancelled { refund_amount, .. } => {
                self.state = BookingState::Cancelled;
                self.refunded_amount = *refund_amount;
            }
        }

        let at = event.occurred_at();
        if self.state != from {
            self.transitions.push(StateTransition {
                from,
                to: self.state,
                at,
            });
        }
        self.last_modified = at;
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.decide(command).map(|(_, event)| vec![event])
    }
}

/// Presentation copy of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSnapshot {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub state: BookingState,
    pub line_items: Vec<LineItem>,
    pub total: u64,
    pub paid_amount: u64,
    pub refunded_amount: u64,
    pub transaction_ref: Option<String>,
    pub transitions: Vec<StateTransition>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub version: u64,
}
