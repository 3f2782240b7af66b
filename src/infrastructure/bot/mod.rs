pub mod decision_cache;
pub mod recommender;
pub mod strategies;
