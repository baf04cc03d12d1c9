pub mod control;
pub mod style;

pub use control::{appearance_for, ToggleAppearance, ToggleControl, TOGGLE_ID};
pub use style::{ChromeTokens, PANEL_CHROME};
