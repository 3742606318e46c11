pub mod catalog;
pub mod matching;
pub mod performance;
pub mod question_cache;
pub mod reasoner;

pub use catalog::CatalogService;
pub use matching::LimitPolicy;
pub use performance::PerformanceService;
pub use question_cache::QuestionCache;
pub use reasoner::ReasonerService;
