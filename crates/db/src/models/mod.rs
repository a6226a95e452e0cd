//! Row structs and DTOs for the warehouse scanning schema.

pub mod lot;
pub mod move_line;
pub mod picking;
pub mod quant;
pub mod session;
pub mod stock_move;
pub mod user;
