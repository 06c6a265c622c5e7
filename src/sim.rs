use crate::model::{Transition, WellbeingState, METER_MAX, METER_MIN};

pub const FEED_HUNGER: f32 = 15.0;
pub const FEED_HAPPINESS: f32 = 8.0;
pub const TOY_HAPPINESS: f32 = 12.0;
pub const NOTE_HAPPINESS: f32 = 2.0;
pub const JOKE_HAPPINESS: f32 = 4.0;
pub const DECAY_HUNGER: f32 = 3.0;
pub const DECAY_HAPPINESS: f32 = 4.0;
/// Above this hunger level, idle decay also costs happiness.
pub const STARVING_ABOVE: f32 = 70.0;

impl WellbeingState {
    /// Applies one transition in place. Meters are clamped afterwards.
    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Feed => {
                self.hunger -= FEED_HUNGER;
                self.happiness += FEED_HAPPINESS;
            }
            Transition::GiveToy => {
                self.toys = self.toys.saturating_add(1);
                self.happiness += TOY_HAPPINESS;
            }
            Transition::PlayNote(_) => {
                self.happiness += NOTE_HAPPINESS;
            }
            Transition::ChatJoke => {
                self.happiness += JOKE_HAPPINESS;
            }
            Transition::IdleDecay => {
                self.hunger = (self.hunger + DECAY_HUNGER).clamp(METER_MIN, METER_MAX);
                if self.hunger > STARVING_ABOVE {
                    self.happiness -= DECAY_HAPPINESS;
                }
            }
            Transition::Reset => {
                *self = WellbeingState::default();
            }
        }
        self.clamp_meters();
    }

    pub fn after(mut self, transition: Transition) -> WellbeingState {
        self.apply(transition);
        self
    }
}
