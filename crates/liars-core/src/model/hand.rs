use crate::model::face::Face;
use serde::{Deserialize, Serialize};

/// Dice held by one seat, stored as a count per face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hand {
    counts: [u8; 6],
}

impl Hand {
    pub fn new() -> Self {
        Self { counts: [0; 6] }
    }

    /// Builds a hand from per-face counts ordered one through six.
    pub fn from_counts(counts: [u8; 6]) -> Self {
        Self { counts }
    }

    pub fn with_faces(faces: &[Face]) -> Self {
        let mut hand = Self::new();
        for face in faces {
            hand.add(*face);
        }
        hand
    }

    /// Deals `size` independent uniform dice.
    pub fn roll<R: rand::Rng + ?Sized>(size: u8, rng: &mut R) -> Self {
        let mut hand = Self::new();
        for _ in 0..size {
            hand.add(Face::roll(rng));
        }
        hand
    }

    pub fn add(&mut self, face: Face) {
        self.counts[face.index()] = self.counts[face.index()].saturating_add(1);
    }

    pub fn count(&self, face: Face) -> u8 {
        self.counts[face.index()]
    }

    /// Dice that satisfy a claim on `face`, including wild ones when the rule is active.
    pub fn matching(&self, face: Face, wild: bool) -> u8 {
        if wild && !face.is_wild() {
            self.count(face) + self.count(Face::WILD)
        } else {
            self.count(face)
        }
    }

    pub fn len(&self) -> usize {
        self.counts.iter().map(|c| *c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> &[u8; 6] {
        &self.counts
    }

    /// Highest natural face by count; ties resolve to the lower face.
    pub fn best_natural(&self) -> (Face, u8) {
        let mut best = (Face::Two, self.count(Face::Two));
        for face in Face::NATURAL.iter().copied().skip(1) {
            let count = self.count(face);
            if count > best.1 {
                best = (face, count);
            }
        }
        best
    }

    pub fn faces(&self) -> impl Iterator<Item = Face> + '_ {
        Face::ALL
            .iter()
            .copied()
            .flat_map(move |face| std::iter::repeat(face).take(self.count(face) as usize))
    }
}
