pub mod recipe_service;
pub mod search_service;
pub mod stats_service;
