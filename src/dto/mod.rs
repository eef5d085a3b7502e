pub mod health;
pub mod preview;
pub mod ws;
