use crate::model::face::Face;
use crate::model::seat::SeatId;
use rand::Rng;
use thiserror::Error;

pub const MIN_SUM: u8 = 2;
pub const MAX_SUM: u8 = 12;

/// Two seats, one die each, guessing the sum of both dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuddenDeath {
    first: SeatId,
    second: SeatId,
    dice: [Face; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuddenDeathOutcome {
    Decided {
        winner: SeatId,
        loser: SeatId,
        sum: u8,
    },
    /// Both guesses were equally close; roll again.
    Tied { sum: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SuddenDeathError {
    #[error("guess {guess} is outside {MIN_SUM}..={MAX_SUM}")]
    OutOfRange { guess: u8 },
    #[error("guess {guess} repeats the first guess")]
    Repeated { guess: u8 },
}

impl SuddenDeath {
    pub fn roll<R: Rng + ?Sized>(first: SeatId, second: SeatId, rng: &mut R) -> Self {
        Self::with_dice(first, second, [Face::roll(rng), Face::roll(rng)])
    }

    pub fn with_dice(first: SeatId, second: SeatId, dice: [Face; 2]) -> Self {
        Self {
            first,
            second,
            dice,
        }
    }

    /// Seat that guesses first.
    pub fn first(&self) -> SeatId {
        self.first
    }

    pub fn second(&self) -> SeatId {
        self.second
    }

    pub fn die(&self, seat: SeatId) -> Option<Face> {
        if seat == self.first {
            Some(self.dice[0])
        } else if seat == self.second {
            Some(self.dice[1])
        } else {
            None
        }
    }

    pub fn sum(&self) -> u8 {
        self.dice[0].value() + self.dice[1].value()
    }

    pub fn check_guess(guess: u8, previous: Option<u8>) -> Result<(), SuddenDeathError> {
        if !(MIN_SUM..=MAX_SUM).contains(&guess) {
            return Err(SuddenDeathError::OutOfRange { guess });
        }
        if previous == Some(guess) {
            return Err(SuddenDeathError::Repeated { guess });
        }
        Ok(())
    }

    pub fn resolve(
        &self,
        first_guess: u8,
        second_guess: u8,
    ) -> Result<SuddenDeathOutcome, SuddenDeathError> {
        Self::check_guess(first_guess, None)?;
        Self::check_guess(second_guess, Some(first_guess))?;

        let sum = self.sum();
        let first_miss = first_guess.abs_diff(sum);
        let second_miss = second_guess.abs_diff(sum);
        Ok(match first_miss.cmp(&second_miss) {
            std::cmp::Ordering::Less => SuddenDeathOutcome::Decided {
                winner: self.first,
                loser: self.second,
                sum,
            },
            std::cmp::Ordering::Greater => SuddenDeathOutcome::Decided {
                winner: self.second,
                loser: self.first,
                sum,
            },
            std::cmp::Ordering::Equal => SuddenDeathOutcome::Tied { sum },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(i: usize) -> SeatId {
        SeatId::from_index(i).unwrap()
    }

    #[test]
    fn closer_guess_wins() {
        let duel = SuddenDeath::with_dice(seat(0), seat(1), [Face::Three, Face::Four]);
        assert_eq!(duel.sum(), 7);
        assert_eq!(duel.die(seat(1)), Some(Face::Four));
        assert_eq!(
            duel.resolve(8, 4).unwrap(),
            SuddenDeathOutcome::Decided {
                winner: seat(0),
                loser: seat(1),
                sum: 7
            }
        );
        assert_eq!(
            duel.resolve(12, 7).unwrap(),
            SuddenDeathOutcome::Decided {
                winner: seat(1),
                loser: seat(0),
                sum: 7
            }
        );
    }

    #[test]
    fn equal_distance_is_a_tie() {
        let duel = SuddenDeath::with_dice(seat(0), seat(1), [Face::Three, Face::Four]);
        assert_eq!(duel.resolve(6, 8).unwrap(), SuddenDeathOutcome::Tied { sum: 7 });
    }

    #[test]
    fn invalid_guesses_are_rejected() {
        assert_eq!(
            SuddenDeath::check_guess(1, None),
            Err(SuddenDeathError::OutOfRange { guess: 1 })
        );
        assert_eq!(
            SuddenDeath::check_guess(13, None),
            Err(SuddenDeathError::OutOfRange { guess: 13 })
        );
        assert_eq!(
            SuddenDeath::check_guess(7, Some(7)),
            Err(SuddenDeathError::Repeated { guess: 7 })
        );
        assert!(SuddenDeath::check_guess(7, Some(6)).is_ok());
    }
}
