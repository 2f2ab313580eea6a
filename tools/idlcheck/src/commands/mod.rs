pub mod check;
pub mod print;
