pub mod event;
pub mod reactor;
pub mod recorder;
pub mod state;
pub mod time;
