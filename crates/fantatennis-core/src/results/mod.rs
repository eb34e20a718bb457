pub mod import;
pub mod tournament;
