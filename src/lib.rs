pub mod analysis;
pub mod cli;
pub mod config;
pub mod global;
pub mod history;
pub mod media;
pub mod notification;
pub mod pipeline;
pub mod presenter;
pub mod report;
