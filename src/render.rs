use crate::app::{ChatLine, Speaker};
use crossterm::{
    cursor,
    execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use octopus::model::{Mood, Note, WellbeingState};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    /// Leaves the alternate screen. Raw mode is switched off even if that fails.
    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        let restored = queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )
        .and_then(|()| self.out.flush());
        let raw_off = terminal::disable_raw_mode();
        restored?;
        raw_off?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if c.bold != last_bold {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Text helpers
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    draw_text_styled(buf, x, y, s, fg, bg, false);
}

fn draw_text_styled(
    buf: &mut CellBuffer,
    x: u16,
    y: u16,
    s: &str,
    fg: Color,
    bg: Color,
    bold: bool,
) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg, bold });
    }
}

pub(crate) fn bar(value01: f32, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f32 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

/// Splits `text` into lines of at most `width` chars, breaking on spaces when it can.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        loop {
            let line_len = line.chars().count();
            let word_len = word.chars().count();
            let sep = usize::from(line_len > 0);
            if line_len + sep + word_len <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(&word);
                break;
            }
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                continue;
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
            if word.is_empty() {
                break;
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/* -----------------------------
   Octopus
------------------------------ */

const OCTOPUS: [&str; 8] = [
    "      _______      ",
    "    /         \\    ",
    "   /  (o) (o)  \\   ",
    "  |             |  ",
    "  |     ---     |  ",
    "   \\___________/   ",
    "   /// /| |\\ \\\\\\   ",
    "  ((( ( ) ( ) )))  ",
];

pub(crate) fn mood_color(mood: Mood, enable_color: bool) -> Color {
    if !enable_color {
        return Color::White;
    }
    match mood {
        Mood::Happy => Color::Rgb {
            r: 0xff,
            g: 0xc4,
            b: 0xf0,
        },
        Mood::Okay => Color::Rgb {
            r: 0xb6,
            g: 0x6c,
            b: 0xf9,
        },
        Mood::Sad => Color::Rgb {
            r: 0x7f,
            g: 0xb3,
            b: 0xff,
        },
    }
}

fn mouth(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "  |    \\___/    |  ",
        Mood::Okay => OCTOPUS[4],
        Mood::Sad => "  |    /‾‾‾\\    |  ",
    }
}

pub(crate) fn draw_octopus(
    buf: &mut CellBuffer,
    st: &WellbeingState,
    cx: i32,
    cy: i32,
    enable_color: bool,
) {
    let bg = Color::Black;
    let mood = st.mood();
    let fg = mood_color(mood, enable_color);

    let w = OCTOPUS[0].chars().count() as i32;
    let h = OCTOPUS.len() as i32;
    let x0 = cx - w / 2;
    let y0 = cy - h / 2;

    for (yy, line) in OCTOPUS.iter().enumerate() {
        let line = if yy == 4 { mouth(mood) } else { line };
        let y = y0 + yy as i32;
        if y < 0 || y >= buf.h as i32 {
            continue;
        }
        for (i, ch) in line.chars().enumerate() {
            let x = x0 + i as i32;
            if x >= 0 && x < buf.w as i32 && ch != ' ' {
                buf.set(
                    x as u16,
                    y as u16,
                    Cell {
                        ch,
                        fg,
                        bg,
                        bold: false,
                    },
                );
            }
        }
    }

    if st.hunger > 70.0 {
        let text = "*rumble*";
        let x = cx - text.len() as i32 / 2;
        let y = y0 + h + 1;
        if x >= 0 && y >= 0 {
            draw_text(buf, x as u16, y as u16, text, Color::Yellow, bg);
        }
    }
}

/* -----------------------------
   UI overlay (meters + chat)
------------------------------ */

pub(crate) struct View<'a> {
    pub(crate) state: &'a WellbeingState,
    pub(crate) chat: &'a [ChatLine],
    pub(crate) input: Option<&'a str>,
    pub(crate) last_note: Option<Note>,
    pub(crate) enable_color: bool,
}

pub(crate) fn ui_overlay(buf: &mut CellBuffer, view: &View<'_>, panel_w: u16) {
    let bg = Color::Black;
    let fg = Color::White;
    let st = view.state;

    let title = format!("Octopus  |  Mood: {:?}  |  Toys: {}", st.mood(), st.toys);
    draw_text_styled(buf, 1, 0, &title, fg, bg, true);

    let meters = [
        ("Hunger", st.hunger, Color::Yellow),
        ("Happy ", st.happiness, Color::Magenta),
    ];
    for (i, (name, val, color)) in meters.iter().enumerate() {
        let s = format!("{name}: {} {:>3}%", bar(*val / 100.0, 14), val.round() as i32);
        let c = if view.enable_color { *color } else { fg };
        draw_text(buf, 1, 2 + i as u16, &s, c, bg);
    }
    draw_text(buf, 1, 4, &format!("Toys  : {}", st.toys), fg, bg);

    if let Some(note) = view.last_note {
        let s = format!("♪ {note}");
        draw_text(buf, 1, 5, &s, if view.enable_color { Color::Cyan } else { fg }, bg);
    }

    // chat log, newest at the bottom
    let top = 7u16;
    let bottom = buf.h.saturating_sub(3);
    if bottom > top {
        let width = panel_w.saturating_sub(2) as usize;
        let mut rendered: Vec<(String, Color)> = Vec::new();
        for line in view.chat {
            let (prefix, color) = match line.speaker {
                Speaker::User => ("You: ", Color::Grey),
                Speaker::Octo => ("Octopus: ", mood_color(st.mood(), view.enable_color)),
                Speaker::System => ("", Color::DarkGrey),
            };
            let color = if view.enable_color { color } else { fg };
            for l in wrap(&format!("{prefix}{}", line.text), width) {
                rendered.push((l, color));
            }
        }
        let rows = (bottom - top) as usize;
        let skip = rendered.len().saturating_sub(rows);
        for (i, (l, color)) in rendered.iter().skip(skip).enumerate() {
            draw_text(buf, 1, top + i as u16, l, *color, bg);
        }
    }

    if let Some(input) = view.input {
        let s = format!("> {input}_");
        draw_text(buf, 1, buf.h.saturating_sub(2), &s, fg, bg);
    }

    let help = match view.input {
        Some(_) => "Chat: type | enter send | esc cancel",
        None => "Keys: f feed | t toy | r reset | 1-8 notes | c chat | q quit",
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), help, Color::DarkGrey, bg);
}
