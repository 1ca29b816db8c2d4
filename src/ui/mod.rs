//! Terminal UI: icons, pure render functions, and the redraw screen.

pub mod icons;
pub mod screen;
pub mod view;

pub use screen::{WatchScreen, connect_spinner};
pub use view::{ViewState, render_empty_state, render_stage_nav, render_steps};
