pub mod clue;
pub mod events;
pub mod hunt;
pub mod media;
pub mod print;
