pub mod bid;
pub mod face;
pub mod hand;
pub mod round;
pub mod rules;
pub mod seat;
