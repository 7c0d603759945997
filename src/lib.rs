// Library exports for examgen

pub mod compile;
pub mod config;
pub mod generator;
pub mod question;
pub mod question_reader;
pub mod render;
pub mod shuffle;
pub mod template;
