pub mod budget;
pub mod clock;
pub mod data;
pub mod store;
