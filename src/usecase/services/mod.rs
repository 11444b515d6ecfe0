pub mod board_service;
pub mod connection;
