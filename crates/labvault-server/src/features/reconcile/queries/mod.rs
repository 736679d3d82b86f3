pub mod find_orphans;

pub use find_orphans::{FindOrphansError, FindOrphansQuery};
