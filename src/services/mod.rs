//! Business logic services.
//!
//! Services orchestrate storage backends and LLM providers and provide
//! high-level operations.

mod cache;
pub mod daily;
mod story;

pub use cache::{DayCache, NoCache, SelectionCache};
pub use daily::DailyWordService;
pub use story::StoryService;
