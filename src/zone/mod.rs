pub mod directory;
pub mod parser;
pub mod record;
pub mod store;
#[allow(clippy::module_inception)]
pub mod zone;

pub use directory::{load_all, load_one, zone_exists, zone_file_path};
pub use parser::ZoneParser;
pub use record::{RRset, Rdata};
pub use store::{ZoneStore, ZoneWriter};
pub use zone::Zone;
