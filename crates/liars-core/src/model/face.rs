use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Face {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::One,
        Face::Two,
        Face::Three,
        Face::Four,
        Face::Five,
        Face::Six,
    ];

    /// Faces that can be matched by a wild one.
    pub const NATURAL: [Face; 5] = [Face::Two, Face::Three, Face::Four, Face::Five, Face::Six];

    pub const WILD: Face = Face::One;

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Face::One),
            2 => Some(Face::Two),
            3 => Some(Face::Three),
            4 => Some(Face::Four),
            5 => Some(Face::Five),
            6 => Some(Face::Six),
            _ => None,
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Zero-based position, used to index per-face arrays.
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    pub const fn is_wild(self) -> bool {
        matches!(self, Face::One)
    }

    pub fn roll<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Face::ALL[rng.gen_range(0..Face::ALL.len())]
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::Face;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn from_value_maps_valid_range() {
        assert_eq!(Face::from_value(1), Some(Face::One));
        assert_eq!(Face::from_value(6), Some(Face::Six));
        assert_eq!(Face::from_value(0), None);
        assert_eq!(Face::from_value(7), None);
    }

    #[test]
    fn index_is_zero_based() {
        for (i, face) in Face::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
            assert_eq!(face.value() as usize, i + 1);
        }
    }

    #[test]
    fn only_one_is_wild() {
        assert!(Face::One.is_wild());
        assert!(Face::NATURAL.iter().all(|face| !face.is_wild()));
    }

    #[test]
    fn rolls_cover_every_face() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 6];
        for _ in 0..600 {
            seen[Face::roll(&mut rng).index()] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }
}
