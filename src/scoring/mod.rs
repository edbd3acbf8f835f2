pub mod draft;
pub mod engine;
pub mod ranking;
pub mod rubric;

pub use draft::DraftTracker;
pub use engine::{aggregate, Aggregate, CategoryMean, SampleAggregate};
pub use ranking::{rank, Medal, RankedSample};
pub use rubric::{Category, Rubric};
