pub mod clue;
pub mod hunt;
