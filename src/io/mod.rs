pub mod report_write;
pub mod tabular_read;

pub use tabular_read::InputFormat;
