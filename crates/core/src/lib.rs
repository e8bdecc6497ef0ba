//! Configuration home resolution and launch settings for the Hemu front-end.

pub mod command_line;
pub mod error;
pub mod home;
pub mod logging;
pub mod save_state;
pub mod settings;
pub mod switches;
pub mod watch_hud;

pub use command_line::{CommandLine, ParseContext};
pub use error::{ArgumentError, ConfigError, SwitchError};
pub use home::{ConfigHome, DataFolder, HomeSource, ResolutionReport};
pub use settings::Configuration;
pub use switches::SwitchRegistry;
