pub mod donut;
pub mod panels;
pub mod plot;
