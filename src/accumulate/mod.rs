pub mod accumulator;
pub mod buffer;
