pub mod entity;
pub mod invariants;

pub use entity::{Language, Story, StoryPatch};
pub use invariants::{parse_rank_input, story_warnings, validate_story, StoryWarning};
