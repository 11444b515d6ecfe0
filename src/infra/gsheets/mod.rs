pub mod a1;
pub mod client;
pub mod values;
