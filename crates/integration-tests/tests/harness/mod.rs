#![allow(dead_code)]

pub mod config;
pub mod fixtures;
pub mod mock_fal;
pub mod server;
