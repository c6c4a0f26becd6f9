//! UI components for RainScope Desktop.
//!
//! Each panel renders as an anchored floating window over the map and
//! reports what the user asked for as a plain action struct, leaving the
//! application to apply it.

pub mod controls;
pub mod legend;
pub mod search;
pub mod settings;
pub mod side_panel;
pub mod weather_panel;

pub use controls::{show_control_bar, show_loading_bar, ControlAction};
pub use legend::show_legend;
pub use search::{TopBar, TopBarAction};
pub use settings::{show_settings, SettingsAction};
pub use side_panel::{show_side_panel, SidePanelAction, SidePanelState};
pub use weather_panel::show_weather_panel;
