use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cinema_core::{DomainError, DomainResult, ShowingId};

use crate::layout::LayoutConfig;
use crate::seat::{Seat, SeatCode, SeatSnapshot, SeatStatus};

/// Why a seat cannot move to the requested status.
///
/// These are ordinary outcomes, logged and turned into `false` by the
/// registry mutators.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SeatRejection {
    #[error("seat {0} does not exist in this hall")]
    NoSuchSeat(SeatCode),
    #[error("seat {0} is already selected")]
    AlreadySelected(SeatCode),
    #[error("seat {0} is already booked")]
    Booked(SeatCode),
    #[error("seat {0} is out of service")]
    Unavailable(SeatCode),
    #[error("seat {0} is not selected")]
    NotSelected(SeatCode),
}

/// Authoritative seat store for one showing.
///
/// Seats live in a row-major arena addressed by seat code. Nothing outside
/// the registry can change a seat's status.
#[derive(Debug, Clone)]
pub struct SeatRegistry {
    showing_id: ShowingId,
    rows: u8,
    columns: u16,
    seats: Vec<Seat>,
    selected: BTreeSet<SeatCode>,
}

impl SeatRegistry {
    /// Build the seat grid for a showing.
    ///
    /// Categories and prices come from `layout`; seats listed as unavailable
    /// or pre-booked start in those statuses.
    pub fn initialize(showing_id: ShowingId, layout: &LayoutConfig) -> DomainResult<Self> {
        layout.validate()?;

        let pre_booked = layout.pre_booked();
        let seats: Vec<Seat> = layout
            .codes()
            .map(|code| {
                let category = layout.category_for(&code);
                let price = layout.pricing.price_for(category, layout.base_price);
                let status = if layout.unavailable.contains(&code) {
                    SeatStatus::Unavailable
                } else if pre_booked.contains(&code) {
                    SeatStatus::Booked
                } else {
                    SeatStatus::Available
                };
                Seat::new(code, category, status, price)
            })
            .collect();

        tracing::info!(
            showing_id = %showing_id,
            rows = layout.rows,
            columns = layout.columns,
            pre_booked = pre_booked.len(),
            "seat registry initialized"
        );

        Ok(Self {
            showing_id,
            rows: layout.rows,
            columns: layout.columns,
            seats,
            selected: BTreeSet::new(),
        })
    }

    pub fn showing_id(&self) -> ShowingId {
        self.showing_id
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    fn index_of(&self, code: &SeatCode) -> Option<usize> {
        if code.row_index() >= self.rows || code.column() > self.columns {
            return None;
        }
        Some(usize::from(code.row_index()) * usize::from(self.columns) + usize::from(code.column() - 1))
    }

    /// Parse raw user input into a code of this hall.
    ///
    /// Malformed input is `InvalidId`; a well-formed code outside the grid is `NotFound`.
    pub fn resolve(&self, raw: &str) -> DomainResult<SeatCode> {
        let code: SeatCode = raw.parse()?;
        if self.index_of(&code).is_none() {
            return Err(DomainError::not_found(format!("seat {code}")));
        }
        Ok(code)
    }

    pub fn seat(&self, code: &SeatCode) -> Option<&Seat> {
        self.index_of(code).map(|idx| &self.seats[idx])
    }

    fn seat_mut(&mut self, code: &SeatCode) -> Option<&mut Seat> {
        let idx = self.index_of(code)?;
        self.seats.get_mut(idx)
    }

    /// Whether `select(code)` would succeed, and why not.
    pub fn check_selectable(&self, code: &SeatCode) -> Result<(), SeatRejection> {
        let seat = self.seat(code).ok_or(SeatRejection::NoSuchSeat(*code))?;
        match seat.status() {
            SeatStatus::Available => Ok(()),
            SeatStatus::Selected => Err(SeatRejection::AlreadySelected(*code)),
            SeatStatus::Booked => Err(SeatRejection::Booked(*code)),
            SeatStatus::Unavailable => Err(SeatRejection::Unavailable(*code)),
        }
    }

    fn check_selected(&self, code: &SeatCode) -> Result<(), SeatRejection> {
        let seat = self.seat(code).ok_or(SeatRejection::NoSuchSeat(*code))?;
        match seat.status() {
            SeatStatus::Selected => Ok(()),
            _ => Err(SeatRejection::NotSelected(*code)),
        }
    }

    /// Available → Selected. Returns `false` for any other starting status or
    /// an unknown seat.
    pub fn select(&mut self, code: &SeatCode) -> bool {
        if let Err(reason) = self.check_selectable(code) {
            tracing::debug!(showing_id = %self.showing_id, seat = %code, %reason, "select refused");
            return false;
        }
        if let Some(seat) = self.seat_mut(code) {
            seat.set_status(SeatStatus::Selected);
        }
        self.selected.insert(*code);
        tracing::debug!(showing_id = %self.showing_id, seat = %code, "seat selected");
        true
    }

    /// Selected → Available.
    pub fn deselect(&mut self, code: &SeatCode) -> bool {
        if let Err(reason) = self.check_selected(code) {
            tracing::debug!(showing_id = %self.showing_id, seat = %code, %reason, "deselect refused");
            return false;
        }
        if let Some(seat) = self.seat_mut(code) {
            seat.set_status(SeatStatus::Available);
        }
        self.selected.remove(code);
        tracing::debug!(showing_id = %self.showing_id, seat = %code, "seat deselected");
        true
    }

    /// Selected → Booked for every code, or for none of them.
    ///
    /// Duplicate codes count once. An empty request confirms nothing and
    /// returns `false`.
    pub fn confirm(&mut self, codes: &[SeatCode]) -> bool {
        let requested: BTreeSet<SeatCode> = codes.iter().copied().collect();
        if requested.is_empty() {
            tracing::debug!(showing_id = %self.showing_id, "confirm refused: no seats given");
            return false;
        }
        if let Some(reason) = requested.iter().find_map(|code| self.check_selected(code).err()) {
            tracing::debug!(showing_id = %self.showing_id, %reason, "confirm refused");
            return false;
        }

        for code in &requested {
            if let Some(seat) = self.seat_mut(code) {
                seat.set_status(SeatStatus::Booked);
            }
            self.selected.remove(code);
        }
        tracing::info!(
            showing_id = %self.showing_id,
            seats = requested.len(),
            "seats booked"
        );
        true
    }

    /// All seats in row-major order.
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seats_in_row(&self, row_letter: char) -> &[Seat] {
        let row = row_letter.to_ascii_uppercase() as usize;
        if !row_letter.is_ascii_alphabetic() || row - usize::from(b'A') >= usize::from(self.rows) {
            return &[];
        }
        let start = (row - usize::from(b'A')) * usize::from(self.columns);
        &self.seats[start..start + usize::from(self.columns)]
    }

    pub fn available_seats(&self) -> Vec<&Seat> {
        self.seats.iter().filter(|s| s.is_available()).collect()
    }

    /// Currently selected seats, in row-major order.
    pub fn selected_seats(&self) -> Vec<&Seat> {
        self.selected.iter().filter_map(|code| self.seat(code)).collect()
    }

    pub fn selected_codes(&self) -> Vec<SeatCode> {
        self.selected.iter().copied().collect()
    }

    /// Sum of selected seat prices (couple seats are already priced double).
    pub fn selected_total(&self) -> u64 {
        self.selected_seats().iter().map(|s| s.price()).sum()
    }

    pub fn count_by_status(&self, status: SeatStatus) -> usize {
        self.seats.iter().filter(|s| s.status() == status).count()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            showing_id: self.showing_id,
            rows: self.rows,
            columns: self.columns,
            seats: self.seats.iter().map(Seat::snapshot).collect(),
            selected: self.selected_codes(),
            selected_total: self.selected_total(),
        }
    }
}

/// Presentation copy of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub showing_id: ShowingId,
    pub rows: u8,
    pub columns: u16,
    pub seats: Vec<SeatSnapshot>,
    pub selected: Vec<SeatCode>,
    pub selected_total: u64,
}
