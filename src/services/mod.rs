// Services module - business logic layer

pub mod actors;
pub mod api_keys;
pub mod filter_query;
pub mod genres;
pub mod import;
pub mod shows;
pub mod stats;
