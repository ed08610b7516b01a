pub mod batch;
pub mod config;
pub mod keywords;
pub mod parse;
pub mod rules;
