pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, section, success, warn};
pub use table::{channel_table, ChannelRow};
pub use theme::{theme, Theme};
