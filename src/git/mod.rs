//! Git operations: release tags, change windows, and tagging.

pub mod executor;
pub mod tags;
pub mod window;

pub use executor::tag_and_push;
pub use tags::{Git2TagRepository, TagRepository, latest_tag, latest_tag_in, release_tag_name, slugify};
pub use window::{ChangeWindow, DiffProvider, Git2DiffProvider, WindowBase, change_window, change_window_with};
