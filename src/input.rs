use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use octopus::model::Note;
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Chat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum UiAction {
    Feed,
    GiveToy,
    Reset,
    PlayNote(Note),
    ChatOpen,
    ChatChar(char),
    ChatBackspace,
    ChatSend,
    ChatCancel,
    Quit,
}

pub(crate) fn collect_input_nonblocking(
    max_frame_time: Duration,
) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(mode: InputMode, ev: &InputEvent) -> Option<UiAction> {
    if matches!(ev.key, KeyCode::Char('c') | KeyCode::Char('C'))
        && ev.mods.contains(KeyModifiers::CONTROL)
    {
        return Some(UiAction::Quit);
    }

    match mode {
        InputMode::Chat => match ev.key {
            KeyCode::Enter => Some(UiAction::ChatSend),
            KeyCode::Esc => Some(UiAction::ChatCancel),
            KeyCode::Backspace => Some(UiAction::ChatBackspace),
            KeyCode::Char(ch) if !ch.is_control() => Some(UiAction::ChatChar(ch)),
            _ => None,
        },
        InputMode::Normal => match ev.key {
            KeyCode::Char('f') | KeyCode::Char('F') => Some(UiAction::Feed),
            KeyCode::Char('t') | KeyCode::Char('T') => Some(UiAction::GiveToy),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(UiAction::Reset),
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Char('/') => {
                Some(UiAction::ChatOpen)
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(UiAction::Quit),
            KeyCode::Char(d @ '1'..='8') => {
                Note::from_slot(d as u8 - b'0').map(UiAction::PlayNote)
            }
            _ => None,
        },
    }
}
