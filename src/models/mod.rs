pub mod performance;
pub mod question;
pub mod reasoning;

pub use performance::{AttemptRecord, PerformanceRecord};
pub use question::{GroupingRow, QuestionRecord, SeriesBuckets};
pub use reasoning::Reasoning;
