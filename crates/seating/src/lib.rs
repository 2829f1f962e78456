//! Seat selection for one showing.
//!
//! [`SeatRegistry`] is the single writer of seat status. Mutations that should
//! be reversible go through [`CommandHistory`], which wraps them in
//! [`SeatCommand`]s and keeps bounded undo/redo stacks.
//!
//! Everything here is synchronous and single-threaded. A host that shares a
//! registry between sessions must serialise access to it (one lock per
//! showing, one per session history).

pub mod command;
pub mod history;
pub mod layout;
pub mod pricing;
pub mod registry;
pub mod seat;

pub use command::{SeatAction, SeatCommand};
pub use history::{BatchOutcome, CommandHistory, HistoryConfig, HistoryEntry};
pub use layout::{LayoutConfig, PreBooking};
pub use pricing::PricingPolicy;
pub use registry::{RegistrySnapshot, SeatRegistry, SeatRejection};
pub use seat::{Seat, SeatCategory, SeatCode, SeatSnapshot, SeatStatus};
