pub mod filters;
pub mod retry;
