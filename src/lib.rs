// src/lib.rs

//! Steam Workshop Scanner Library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
