//! Booking lifecycle domain module.
//!
//! A booking moves `Draft → Pending → Paid → Confirmed → Completed`, with
//! `Cancelled` reachable from the first four. [`lifecycle::transition`] is the
//! pure decision function; [`Booking`] is the aggregate that records line
//! items, payments and the transition log.
//!
//! Events the current state does not accept are ignored, never raised: callers
//! get a [`TransitionOutcome`] describing what happened or why nothing did.

pub mod booking;
pub mod lifecycle;
pub mod line_item;

pub use booking::{
    Booking, BookingCommand, BookingEvent, BookingSnapshot, StateTransition, TransitionOutcome,
};
pub use lifecycle::{
    BookingState, Effect, LifecycleEvent, RefundPolicy, Rejection, Transition, TransitionContext,
    transition,
};
pub use line_item::{LineItem, LineItemSum, TotalCalculator};
