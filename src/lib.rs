pub mod app;
pub mod chart;
pub mod color;
pub mod data;
pub mod laps;
pub mod state;
pub mod ui;
