pub mod ai;
pub mod pipeline;
