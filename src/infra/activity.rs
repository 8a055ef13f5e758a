mod manual;
mod terminal;

pub use manual::ManualActivitySource;
pub use terminal::{parse_input, InputCommand, TerminalFocusSource};
