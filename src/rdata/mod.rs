pub mod codec;
pub mod registry;

pub use codec::RecordResponse;
pub use registry::{RecordTypeInfo, list_types, schema};
