use crate::input::{collect_input_nonblocking, map_event_to_action, InputMode, UiAction};
use crate::render::{draw_octopus, ui_overlay, Terminal, View};
use anyhow::Context;
use octopus::chat::{ChatIntent, FED_REPLY, GREETING, RESET_LINE, TOY_REPLY};
use octopus::config::{load_settings, save_settings_atomic, Overrides, Paths, Settings};
use octopus::model::Note;
use octopus::scheduler::DecayScheduler;
use octopus::session::Session;
use octopus::storage::FileStorage;
use rand::{rngs::StdRng, SeedableRng};
use std::cell::Cell;
use std::cmp::{max, min};
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

const CHAT_MAX_LINES: usize = 200;
const CHAT_INPUT_MAX: usize = 120;
const NOTE_SHOWN_FOR: Duration = Duration::from_millis(1500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Speaker {
    User,
    Octo,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChatLine {
    pub(crate) speaker: Speaker,
    pub(crate) text: String,
}

/// Chat history plus the octopus's replies that are still "typing".
#[derive(Default)]
pub(crate) struct ChatLog {
    lines: Vec<ChatLine>,
    pending: Vec<(Instant, &'static str)>,
}

impl ChatLog {
    pub(crate) fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.lines.push(ChatLine {
            speaker,
            text: text.into(),
        });
        if self.lines.len() > CHAT_MAX_LINES {
            let excess = self.lines.len() - CHAT_MAX_LINES;
            self.lines.drain(..excess);
        }
    }

    pub(crate) fn schedule_reply(&mut self, at: Instant, text: &'static str) {
        self.pending.push((at, text));
    }

    /// Moves replies that are due into the log, oldest first. True if any moved.
    pub(crate) fn release_due(&mut self, now: Instant) -> bool {
        let mut due: Vec<_> = Vec::new();
        self.pending.retain(|&(at, text)| {
            if at <= now {
                due.push((at, text));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(at, _)| at);
        let any = !due.is_empty();
        for (_, text) in due {
            self.push(Speaker::Octo, text);
        }
        any
    }

    pub(crate) fn lines(&self) -> &[ChatLine] {
        &self.lines
    }
}

pub(crate) struct Options {
    pub(crate) overrides: Overrides,
    pub(crate) reset: bool,
}

pub(crate) struct App {
    /// As read from disk; this is what gets written back on exit.
    saved_settings: Settings,
    settings: Settings,
    paths: Paths,
    session: Session<FileStorage>,
    term: Terminal,
    chat: ChatLog,
    mode: InputMode,
    input: String,
    last_note: Option<(Note, Instant)>,
    rng: StdRng,
    dirty: Rc<Cell<bool>>,
    should_quit: bool,
}

impl App {
    fn init(paths: Paths, opts: Options) -> anyhow::Result<Self> {
        let saved_settings = load_settings(&paths.settings_path);
        let settings = opts.overrides.apply(&saved_settings);

        let storage = FileStorage::new(paths.data_dir.clone());
        let scheduler = DecayScheduler::new(settings.decay_period());
        let (mut session, outcome) =
            Session::open(storage, settings.storage_key.clone(), scheduler);
        tracing::info!(
            data_dir = %paths.data_dir.display(),
            restored = !outcome.is_defaulted(),
            "session opened"
        );
        if opts.reset {
            session.on_reset();
        }

        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        session.subscribe(move |_, _| flag.set(true));

        let mut chat = ChatLog::default();
        chat.push(Speaker::System, GREETING);

        let term = Terminal::begin().context("could not set up the terminal")?;

        Ok(Self {
            saved_settings,
            settings,
            paths,
            session,
            term,
            chat,
            mode: InputMode::Normal,
            input: String::new(),
            last_note: None,
            rng: StdRng::from_entropy(),
            dirty,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let result = self.run_loop();
        self.session.scheduler_mut().stop();
        let term = &mut self.term;
        let closed = close_out(
            result,
            || term.end(),
            &self.paths.settings_path,
            &self.saved_settings,
        );
        tracing::info!(state = ?self.session.state(), "session closed");
        closed
    }

    fn run_loop(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        self.session.scheduler_mut().start(Instant::now());
        tracing::info!(period = ?self.session.scheduler().period(), "decay scheduler armed");

        while !self.should_quit {
            let frame_start = Instant::now();
            if self.term.resize_if_needed()? {
                self.dirty.set(true);
            }

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(self.mode, &ev) {
                    self.handle(action, Instant::now());
                }
                if self.should_quit {
                    break;
                }
            }

            let now = Instant::now();
            self.session.pump(now);
            if self.chat.release_due(now) {
                self.dirty.set(true);
            }
            let note_expired = matches!(
                self.last_note,
                Some((_, at)) if now.duration_since(at) >= NOTE_SHOWN_FOR
            );
            if note_expired {
                self.last_note = None;
                self.dirty.set(true);
            }

            if self.dirty.replace(false) {
                self.render_frame()?;
            }

            spin_sleep(frame_dt, frame_start);
        }
        Ok(())
    }

    fn handle(&mut self, action: UiAction, now: Instant) {
        match action {
            UiAction::Feed => {
                self.session.on_feed();
                self.chat.push(Speaker::Octo, FED_REPLY);
            }
            UiAction::GiveToy => {
                self.session.on_give_toy();
                self.chat.push(Speaker::Octo, TOY_REPLY);
            }
            UiAction::Reset => {
                self.session.on_reset();
                self.chat.push(Speaker::System, RESET_LINE);
            }
            UiAction::PlayNote(note) => {
                self.session.on_note(note);
                self.last_note = Some((note, now));
            }
            UiAction::ChatOpen => {
                self.mode = InputMode::Chat;
                self.input.clear();
            }
            UiAction::ChatChar(ch) => {
                if self.input.chars().count() < CHAT_INPUT_MAX {
                    self.input.push(ch);
                }
            }
            UiAction::ChatBackspace => {
                self.input.pop();
            }
            UiAction::ChatCancel => {
                self.mode = InputMode::Normal;
                self.input.clear();
            }
            UiAction::ChatSend => {
                self.mode = InputMode::Normal;
                let text = std::mem::take(&mut self.input);
                let text = text.trim();
                if let (Some(intent), _) = self.session.on_chat_text(text) {
                    self.chat.push(Speaker::User, text);
                    self.queue_reply(intent, now);
                }
            }
            UiAction::Quit => self.should_quit = true,
        }
        self.dirty.set(true);
    }

    fn queue_reply(&mut self, intent: ChatIntent, now: Instant) {
        let reply = intent.reply(&mut self.rng);
        self.chat.schedule_reply(now + intent.reply_delay(), reply);
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let bg = crossterm::style::Color::Black;
        self.term.cur.clear(bg);

        let cols = self.term.cols as i32;
        let rows = self.term.rows as i32;
        let panel_w = min(max(32, cols / 2), cols);
        let pet_w = cols - panel_w;

        let state = *self.session.state();
        if pet_w >= 20 {
            draw_octopus(
                &mut self.term.cur,
                &state,
                panel_w + pet_w / 2,
                rows / 2,
                self.settings.enable_color,
            );
        }

        let view = View {
            state: &state,
            chat: self.chat.lines(),
            input: match self.mode {
                InputMode::Chat => Some(self.input.as_str()),
                InputMode::Normal => None,
            },
            last_note: self.last_note.map(|(n, _)| n),
            enable_color: self.settings.enable_color,
        };
        ui_overlay(&mut self.term.cur, &view, panel_w as u16);

        self.term.present(true)?;
        Ok(())
    }
}

pub(crate) fn run(paths: Paths, opts: Options) -> anyhow::Result<()> {
    let mut app = App::init(paths, opts)?;
    app.run()
}

/// Runs every shutdown step regardless of earlier failures and reports the
/// first error: the loop's, then the terminal's, then the settings save.
fn close_out(
    result: anyhow::Result<()>,
    end_terminal: impl FnOnce() -> anyhow::Result<()>,
    settings_path: &Path,
    saved_settings: &Settings,
) -> anyhow::Result<()> {
    let ended = end_terminal();
    let saved = save_settings_atomic(settings_path, saved_settings);
    for err in [&ended, &saved].into_iter().filter_map(|r| r.as_ref().err()) {
        tracing::warn!(error = %err, "shutdown step failed");
    }
    result.and(ended).and(saved)
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_wait_for_their_turn() {
        let t0 = Instant::now();
        let mut log = ChatLog::default();
        log.push(Speaker::User, "tell me a joke");
        log.schedule_reply(t0 + Duration::from_millis(600), "second");
        log.schedule_reply(t0 + Duration::from_millis(500), "first");

        assert!(!log.release_due(t0 + Duration::from_millis(100)));
        assert_eq!(log.lines().len(), 1);

        assert!(log.release_due(t0 + Duration::from_millis(700)));
        let texts: Vec<_> = log.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["tell me a joke", "first", "second"]);
        assert_eq!(log.lines()[2].speaker, Speaker::Octo);
        assert!(!log.release_due(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn settings_are_saved_even_when_the_terminal_fails_to_restore() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let saved = Settings {
            decay_interval_secs: 42,
            ..Settings::default()
        };

        let err = close_out(Ok(()), || Err(anyhow::anyhow!("tty gone")), &path, &saved)
            .unwrap_err();
        assert_eq!(err.to_string(), "tty gone");
        assert_eq!(load_settings(&path), saved);

        let err = close_out(
            Err(anyhow::anyhow!("loop broke")),
            || Err(anyhow::anyhow!("tty gone")),
            &path,
            &saved,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "loop broke");
    }

    #[test]
    fn log_is_bounded() {
        let mut log = ChatLog::default();
        for i in 0..(CHAT_MAX_LINES + 25) {
            log.push(Speaker::System, format!("{i}"));
        }
        assert_eq!(log.lines().len(), CHAT_MAX_LINES);
        assert_eq!(log.lines()[0].text, "25");
    }
}
