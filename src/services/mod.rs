// src/services/mod.rs

pub mod result_recorder;
