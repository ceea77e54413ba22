pub mod hunt;
pub mod shared;
