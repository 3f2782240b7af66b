mod game_state;
mod pattern;

pub use game_state::*;
pub use pattern::*;
