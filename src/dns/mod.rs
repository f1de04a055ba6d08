pub mod enums;
pub mod name;
pub mod wire;

pub use enums::{RecordClass, RecordType};
