use core::fmt;
use serde::{Deserialize, Serialize};

/// Largest supported table.
pub const MAX_SEATS: usize = 12;

/// Stable identity of a place at the table. Survives elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatId(u8);

impl SeatId {
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < MAX_SEATS {
            Some(SeatId(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_SEATS, SeatId};

    #[test]
    fn index_roundtrip() {
        for i in 0..MAX_SEATS {
            let seat = SeatId::from_index(i).expect("in range");
            assert_eq!(seat.index(), i);
        }
        assert_eq!(SeatId::from_index(MAX_SEATS), None);
    }

    #[test]
    fn display_is_stable() {
        assert_eq!(SeatId::from_index(3).unwrap().to_string(), "seat3");
    }
}
