// src/services/mod.rs

pub mod admin;
pub mod scoring;
pub mod submission;
