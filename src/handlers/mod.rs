// src/handlers/mod.rs

pub mod events;
