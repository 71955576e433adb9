pub mod audit;
pub mod widget;
