pub mod raw;
pub mod table;

pub use raw::RawStore;
pub use table::ResultTable;
