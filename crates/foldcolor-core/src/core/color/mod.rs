pub mod catalog;
pub mod gradient;
