use crate::model::seat::{MAX_SEATS, SeatId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSeat {
    pub seat: SeatId,
    pub name: String,
    pub dice: u8,
}

/// Seats in turn order. Eliminated seats stay in place with zero dice and are
/// skipped by every turn-order query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    seats: Vec<TableSeat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DieLoss {
    pub seat: SeatId,
    pub remaining: u8,
    pub eliminated: bool,
}

impl Table {
    /// Seats every name with `dice` dice. Callers validate the seat count.
    pub fn seat_all(names: &[String], dice: u8) -> Self {
        let seats = names
            .iter()
            .take(MAX_SEATS)
            .enumerate()
            .filter_map(|(index, name)| {
                SeatId::from_index(index).map(|seat| TableSeat {
                    seat,
                    name: name.clone(),
                    dice,
                })
            })
            .collect();
        Self { seats }
    }

    pub fn from_seats(seats: Vec<TableSeat>) -> Self {
        Self { seats }
    }

    pub fn seats(&self) -> &[TableSeat] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn get(&self, seat: SeatId) -> Option<&TableSeat> {
        self.seats.iter().find(|s| s.seat == seat)
    }

    pub fn name(&self, seat: SeatId) -> Option<&str> {
        self.get(seat).map(|s| s.name.as_str())
    }

    pub fn dice(&self, seat: SeatId) -> u8 {
        self.get(seat).map(|s| s.dice).unwrap_or(0)
    }

    pub fn is_active(&self, seat: SeatId) -> bool {
        self.dice(seat) > 0
    }

    pub fn active(&self) -> impl Iterator<Item = &TableSeat> + '_ {
        self.seats.iter().filter(|s| s.dice > 0)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn total_dice(&self) -> u8 {
        self.active().map(|s| s.dice).sum()
    }

    /// Die counts of active seats in turn order.
    pub fn sizes(&self) -> Vec<(SeatId, u8)> {
        self.active().map(|s| (s.seat, s.dice)).collect()
    }

    /// First active seat strictly after `from`, wrapping around.
    pub fn next_active(&self, from: SeatId) -> Option<SeatId> {
        let start = self.seats.iter().position(|s| s.seat == from)?;
        let len = self.seats.len();
        (1..=len)
            .map(|offset| &self.seats[(start + offset) % len])
            .find(|s| s.dice > 0)
            .map(|s| s.seat)
    }

    /// Removes one die. `None` when the seat is unknown or already out.
    pub fn remove_die(&mut self, seat: SeatId) -> Option<DieLoss> {
        let entry = self.seats.iter_mut().find(|s| s.seat == seat)?;
        entry.dice = entry.dice.checked_sub(1)?;
        Some(DieLoss {
            seat,
            remaining: entry.dice,
            eliminated: entry.dice == 0,
        })
    }
}
