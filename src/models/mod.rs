// src/models/mod.rs

pub mod catalog;
pub mod exam_result;
pub mod question;
pub mod session;
pub mod user;
