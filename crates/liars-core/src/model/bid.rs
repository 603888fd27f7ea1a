use crate::model::face::Face;
use core::cmp::Ordering;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Public claim that at least `quantity` dice show `face` across every hand in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bid {
    pub face: Face,
    pub quantity: u8,
}

impl Bid {
    pub const fn new(face: Face, quantity: u8) -> Self {
        Self { face, quantity }
    }

    /// Strictly higher under the raise ordering: quantity first, then face.
    pub fn outranks(self, other: Bid) -> bool {
        self > other
    }
}

impl Ord for Bid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.quantity
            .cmp(&other.quantity)
            .then(self.face.cmp(&other.face))
    }
}

impl PartialOrd for Bid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.quantity, self.face)
    }
}

/// What a seat does on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Bid(Bid),
    Challenge,
}

impl Action {
    pub const fn bid(self) -> Option<Bid> {
        match self {
            Action::Bid(bid) => Some(bid),
            Action::Challenge => None,
        }
    }

    pub const fn is_challenge(self) -> bool {
        matches!(self, Action::Challenge)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Bid(bid) => write!(f, "bid {bid}"),
            Action::Challenge => f.write_str("challenge"),
        }
    }
}
