pub mod backends;
pub mod hosts;
