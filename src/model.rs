use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const METER_MIN: f32 = 0.0;
pub const METER_MAX: f32 = 100.0;

/// The pet's well-being record. This is the only thing that gets persisted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellbeingState {
    /// 0..=100, higher is hungrier.
    pub hunger: f32,
    /// 0..=100, higher is better.
    pub happiness: f32,
    pub toys: u32,
}

impl Default for WellbeingState {
    fn default() -> Self {
        Self {
            hunger: 20.0,
            happiness: 50.0,
            toys: 0,
        }
    }
}

impl WellbeingState {
    pub fn new(hunger: f32, happiness: f32, toys: u32) -> Self {
        Self {
            hunger,
            happiness,
            toys,
        }
    }

    pub fn mood(&self) -> Mood {
        Mood::from_happiness(self.happiness)
    }

    pub(crate) fn clamp_meters(&mut self) {
        self.hunger = self.hunger.clamp(METER_MIN, METER_MAX);
        self.happiness = self.happiness.clamp(METER_MIN, METER_MAX);
    }
}

/// Every way the record can change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Feed,
    GiveToy,
    PlayNote(Note),
    ChatJoke,
    IdleDecay,
    Reset,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Feed => "feed",
            Transition::GiveToy => "give-toy",
            Transition::PlayNote(_) => "play-note",
            Transition::ChatJoke => "chat-joke",
            Transition::IdleDecay => "idle-decay",
            Transition::Reset => "reset",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mood {
    Happy,
    Okay,
    Sad,
}

impl Mood {
    pub fn from_happiness(happiness: f32) -> Self {
        if happiness >= 70.0 {
            Mood::Happy
        } else if happiness >= 40.0 {
            Mood::Okay
        } else {
            Mood::Sad
        }
    }
}

/// One key of the music toy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Note {
    C4,
    D4,
    E4,
    F4,
    G4,
    A4,
    B4,
    C5,
}

impl Note {
    pub const ALL: [Note; 8] = [
        Note::C4,
        Note::D4,
        Note::E4,
        Note::F4,
        Note::G4,
        Note::A4,
        Note::B4,
        Note::C5,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Note::C4 => "C4",
            Note::D4 => "D4",
            Note::E4 => "E4",
            Note::F4 => "F4",
            Note::G4 => "G4",
            Note::A4 => "A4",
            Note::B4 => "B4",
            Note::C5 => "C5",
        }
    }

    /// Keyboard slot, 1-based.
    pub fn from_slot(slot: u8) -> Option<Note> {
        match slot {
            1..=8 => Some(Self::ALL[(slot - 1) as usize]),
            _ => None,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown note id: {0:?}")]
pub struct ParseNoteError(pub String);

impl FromStr for Note {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|n| n.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseNoteError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fresh_pet() {
        let st = WellbeingState::default();
        assert_eq!(st, WellbeingState::new(20.0, 50.0, 0));
        assert_eq!(st.mood(), Mood::Okay);
    }

    #[test]
    fn mood_tiers() {
        assert_eq!(Mood::from_happiness(100.0), Mood::Happy);
        assert_eq!(Mood::from_happiness(70.0), Mood::Happy);
        assert_eq!(Mood::from_happiness(69.9), Mood::Okay);
        assert_eq!(Mood::from_happiness(40.0), Mood::Okay);
        assert_eq!(Mood::from_happiness(39.0), Mood::Sad);
        assert_eq!(Mood::from_happiness(0.0), Mood::Sad);
    }

    #[test]
    fn note_ids_parse_case_insensitively() {
        assert_eq!("c4".parse::<Note>(), Ok(Note::C4));
        assert_eq!(" G4 ".parse::<Note>(), Ok(Note::G4));
        assert_eq!("C5".parse::<Note>(), Ok(Note::C5));
        assert!("H2".parse::<Note>().is_err());
    }

    #[test]
    fn note_slots_cover_the_scale() {
        assert_eq!(Note::from_slot(1), Some(Note::C4));
        assert_eq!(Note::from_slot(8), Some(Note::C5));
        assert_eq!(Note::from_slot(0), None);
        assert_eq!(Note::from_slot(9), None);
        for n in Note::ALL {
            assert_eq!(n.to_string().parse::<Note>(), Ok(n));
        }
    }
}
