pub mod align;
pub mod audio;
pub mod config;
pub mod error;
pub mod kernel;
pub mod provider;
pub mod services;

pub use kernel::reactor::Reactor;
