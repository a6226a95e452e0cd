//! Repositories: one struct of associated query functions per table.

pub mod lot_repo;
pub mod move_line_repo;
pub mod move_repo;
pub mod picking_repo;
pub mod quant_repo;
pub mod session_repo;
pub mod user_repo;
