pub mod row_parser;
pub mod schedule_fetcher;

pub use row_parser::*;
pub use schedule_fetcher::*;
