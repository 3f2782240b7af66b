pub mod classifier;
pub mod comparison;
mod game_service;
pub mod hand_analyzer;
pub mod move_generator;

pub use classifier::{classify, ClassificationError};
pub use comparison::beats;
pub use game_service::*;
pub use hand_analyzer::{claim_score, evaluate, HandScore};
pub use move_generator::{all_patterns, can_beat, legal_responses};
