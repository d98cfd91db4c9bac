pub mod discoverer;
pub mod formatter;
