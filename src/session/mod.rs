pub mod clock;
pub mod controller;
pub mod result;
pub mod state;
pub mod transition;
