pub mod cmd;
pub mod context;
