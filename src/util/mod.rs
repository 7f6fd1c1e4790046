pub mod debounce;
pub mod retry;
