pub mod handlers;
pub mod print;
pub mod shell;
