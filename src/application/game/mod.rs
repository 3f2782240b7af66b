mod get_game_view;
mod match_room;
mod pass_turn;
mod play_cards;
mod take_bot_turn;

pub use get_game_view::*;
pub use match_room::*;
pub use pass_turn::*;
pub use play_cards::*;
pub use take_bot_turn::*;
