// Domain layer - sample, series and mark models
pub mod chart;
pub mod mark;
pub mod sample;
pub mod series;
pub mod time;
