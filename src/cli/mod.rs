//! Console front end

pub mod interactive;
pub mod setup;
pub mod ui;
