pub mod altitude;
pub mod angles;
pub mod constants;
pub mod search;
pub mod time;
