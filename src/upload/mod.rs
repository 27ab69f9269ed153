pub mod config;
pub mod fetch;
pub mod front_matter;
pub mod paths;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod table;
pub mod timestamp;
pub mod util;
