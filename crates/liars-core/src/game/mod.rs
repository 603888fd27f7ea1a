pub mod match_state;
pub mod serialization;
pub mod sudden_death;
pub mod table;
