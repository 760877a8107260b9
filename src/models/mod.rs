// src/models/mod.rs

pub mod message;
