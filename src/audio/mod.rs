pub mod capture;
pub mod encode;
