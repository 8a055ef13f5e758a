use std::{io::stdout, sync::Arc};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        DisableFocusChange, EnableFocusChange, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use tokio::{sync::mpsc, task::JoinHandle};

use super::ManualActivitySource;
use crate::ports::ActivitySourcePort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Refresh,
    Quit,
    None,
}

pub fn parse_input(key: KeyEvent) -> InputCommand {
    if key.kind != KeyEventKind::Press {
        return InputCommand::None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => InputCommand::Quit,
        KeyCode::Char('q') | KeyCode::Esc => InputCommand::Quit,
        KeyCode::Char('r') => InputCommand::Refresh,
        _ => InputCommand::None,
    }
}

/// Terminal focus reporting as an activity source. Focus lost maps to
/// "went inactive", focus gained to "became active". Key presses that map to
/// an [`InputCommand`] are forwarded on the returned channel.
///
/// Puts the terminal in raw mode; dropping the source restores it.
pub struct TerminalFocusSource {
    events: Arc<ManualActivitySource>,
    reader: JoinHandle<()>,
}

impl TerminalFocusSource {
    pub fn start() -> Result<(Self, mpsc::UnboundedReceiver<InputCommand>)> {
        enable_raw_mode().context("failed to enable terminal raw mode")?;
        if let Err(err) = execute!(stdout(), EnableFocusChange) {
            let _ = disable_raw_mode();
            return Err(err).context("failed to enable terminal focus reporting");
        }

        let events = Arc::new(ManualActivitySource::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_terminal_events(Arc::clone(&events), tx));

        Ok((Self { events, reader }, rx))
    }

    pub fn source(&self) -> Arc<dyn ActivitySourcePort> {
        self.events.clone()
    }
}

impl Drop for TerminalFocusSource {
    fn drop(&mut self) {
        self.reader.abort();
        let _ = execute!(stdout(), DisableFocusChange);
        let _ = disable_raw_mode();
    }
}

async fn read_terminal_events(
    events: Arc<ManualActivitySource>,
    commands: mpsc::UnboundedSender<InputCommand>,
) {
    let mut reader = EventStream::new();

    while let Some(maybe_event) = reader.next().await {
        match maybe_event {
            Ok(Event::FocusGained) => events.emit_active(),
            Ok(Event::FocusLost) => events.emit_inactive(),
            Ok(Event::Key(key)) => {
                let cmd = parse_input(key);
                if cmd != InputCommand::None && commands.send(cmd).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "terminal event stream failed");
                let _ = commands.send(InputCommand::Quit);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    use super::{parse_input, InputCommand};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        assert_eq!(
            parse_input(key(KeyCode::Char('q'), KeyModifiers::NONE)),
            InputCommand::Quit
        );
        assert_eq!(
            parse_input(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            InputCommand::Quit
        );
        assert_eq!(
            parse_input(key(KeyCode::Esc, KeyModifiers::NONE)),
            InputCommand::Quit
        );
    }

    #[test]
    fn refresh_and_unmapped_keys() {
        assert_eq!(
            parse_input(key(KeyCode::Char('r'), KeyModifiers::NONE)),
            InputCommand::Refresh
        );
        assert_eq!(
            parse_input(key(KeyCode::Char('c'), KeyModifiers::NONE)),
            InputCommand::None
        );
    }

    #[test]
    fn key_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(parse_input(release), InputCommand::None);
    }
}
