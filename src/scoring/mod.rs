pub mod game;
pub mod historical;
pub mod odds;
pub mod outcome;
pub mod scorer;
pub mod season;
pub mod stats;
pub mod undo;

pub use scorer::{PlayerOdds, Scoreboard, Scorer, Stores};
