mod terminal;
mod view;

pub use terminal::TerminalView;
pub use view::{ControlPosture, WidgetView};
