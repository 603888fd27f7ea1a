use super::match_state::{MatchError, MatchState};
use crate::game::table::TableSeat;
use crate::model::seat::SeatId;
use serde::{Deserialize, Serialize};

/// Between-rounds position of a game. Hands are not captured; restoring deals fresh ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSnapshot {
    pub seed: u64,
    pub round_number: u32,
    pub wild: bool,
    pub leader: SeatId,
    pub seats: Vec<TableSeat>,
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        MatchSnapshot {
            seed: state.seed(),
            round_number: state.round_number(),
            wild: state.wild(),
            leader: state.leader(),
            seats: state.table().seats().to_vec(),
        }
    }

    pub fn restore(self) -> Result<MatchState, MatchError> {
        MatchState::from_parts(
            self.seats,
            self.leader,
            self.wild,
            self.round_number,
            self.seed,
        )
    }

    pub fn to_json(state: &MatchState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::MatchSnapshot;
    use crate::game::match_state::MatchState;
    use crate::model::bid::Bid;
    use crate::model::face::Face;

    fn names() -> Vec<String> {
        vec!["ann".into(), "bo".into(), "cy".into()]
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let state = MatchState::with_seed(&names(), 4, true, 99).unwrap();
        let json = MatchSnapshot::to_json(&state).unwrap();
        assert!(json.contains("\"seed\": 99"));
        assert!(json.contains("\"round_number\": 0"));
        assert!(json.contains("\"wild\": true"));
        assert!(json.contains("\"name\": \"bo\""));
        assert!(!json.contains("\"counts\""));
    }

    #[test]
    fn snapshot_roundtrip_restores_table() {
        let mut state = MatchState::with_seed(&names(), 3, false, 123).unwrap();
        assert!(state.round().is_none());
        state.start_round().unwrap();
        let round = state.round_mut().unwrap();
        let opener = round.expected_seat();
        let quantity = round.total_dice();
        round.place_bid(opener, Bid::new(Face::Six, quantity)).unwrap();
        let challenger = round.expected_seat();
        round.challenge(challenger).unwrap();
        state.finish_round().unwrap();

        let json = MatchSnapshot::to_json(&state).unwrap();
        let restored = MatchSnapshot::from_json(&json).unwrap().restore().unwrap();
        assert_eq!(restored.seed(), 123);
        assert_eq!(restored.round_number(), 1);
        assert_eq!(restored.leader(), state.leader());
        assert_eq!(restored.table(), state.table());
        assert_eq!(restored.total_dice(), 8);
    }

    #[test]
    fn restore_rejects_a_single_seat() {
        let mut snapshot =
            MatchSnapshot::capture(&MatchState::with_seed(&names(), 2, false, 5).unwrap());
        snapshot.seats.truncate(1);
        assert!(snapshot.restore().is_err());
    }
}
