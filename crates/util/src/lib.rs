pub mod date_handling;
pub mod http;
pub mod table;
pub mod terminal;
pub mod text_processing;
pub mod units;

pub use date_handling::*;
pub use http::*;
pub use table::TextTable;
pub use text_processing::{redact_sensitive, strip_ansi, visible_width};
pub use units::*;
