pub mod net;
pub mod player;
pub mod universe;
