pub mod chart;
pub mod forecast;
pub mod icons;
pub mod messages;
