mod card;
mod deck;
mod hand;
mod player;

pub use card::*;
pub use deck::*;
pub use hand::*;
pub use player::*;
