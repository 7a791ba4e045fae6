// src/models/mod.rs

pub mod event;
pub mod result;
