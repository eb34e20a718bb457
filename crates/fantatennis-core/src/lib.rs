// Library root: the roster constraint engine, results importer, standings
// pipeline, and the persistence/config plumbing around them.

pub mod config;
pub mod db;
pub mod player;
pub mod results;
pub mod roster;
pub mod standings;
pub mod store;
