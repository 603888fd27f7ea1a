use rand::Rng;

pub const MAX_CRAZINESS: f64 = 0.3;
pub const MAX_AGGRESSIVENESS: f64 = 0.4;

/// Per-seat temperament that steers the bidding policy.
///
/// `craziness` is the chance of inverting a decision; `aggressiveness` is the
/// truth probability below which a standing bid is distrusted. Both are fixed
/// for the life of a seat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Personality {
    craziness: f64,
    aggressiveness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonalityStyle {
    Wildcard,
    Intimidating,
    Watchful,
    Tight,
    Unpredictable,
}

impl Personality {
    /// Values outside the allowed ranges are clamped; non-finite values become zero.
    pub fn new(craziness: f64, aggressiveness: f64) -> Self {
        Self {
            craziness: clamp_unit(craziness, MAX_CRAZINESS),
            aggressiveness: clamp_unit(aggressiveness, MAX_AGGRESSIVENESS),
        }
    }

    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let craziness = rng.gen_range(0.0..=MAX_CRAZINESS);
        let aggressiveness = rng.gen_range(0.0..=MAX_AGGRESSIVENESS);
        Self::new(craziness, aggressiveness)
    }

    pub fn craziness(&self) -> f64 {
        self.craziness
    }

    pub fn aggressiveness(&self) -> f64 {
        self.aggressiveness
    }

    pub fn style(&self) -> PersonalityStyle {
        if self.craziness > 0.2 {
            if self.aggressiveness > 0.3 {
                PersonalityStyle::Wildcard
            } else {
                PersonalityStyle::Intimidating
            }
        } else if self.craziness < 0.05 {
            if self.aggressiveness < 0.2 {
                PersonalityStyle::Watchful
            } else {
                PersonalityStyle::Tight
            }
        } else {
            PersonalityStyle::Unpredictable
        }
    }

    pub fn greeting(&self, name: &str) -> String {
        format!("Hi, my name is {name} and {}", self.style().line())
    }
}

impl PersonalityStyle {
    pub const fn as_str(self) -> &'static str {
        match self {
            PersonalityStyle::Wildcard => "wildcard",
            PersonalityStyle::Intimidating => "intimidating",
            PersonalityStyle::Watchful => "watchful",
            PersonalityStyle::Tight => "tight",
            PersonalityStyle::Unpredictable => "unpredictable",
        }
    }

    pub const fn line(self) -> &'static str {
        match self {
            PersonalityStyle::Wildcard => "I'm a WILDCARD!!",
            PersonalityStyle::Intimidating => "you better watch your step around me.",
            PersonalityStyle::Watchful => "I've got my eye on you...",
            PersonalityStyle::Tight => "I play my dice close to my chest.",
            PersonalityStyle::Unpredictable => "I will be keeping you on your toes.",
        }
    }
}

fn clamp_unit(value: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}
