use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// What the octopus makes of a chat line. Plain keyword rules, nothing smarter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatIntent {
    Joke,
    Hungry,
    Smalltalk,
}

const JOKE_WORDS: [&str; 3] = ["joke", "funny", "laugh"];
const HUNGRY_WORDS: [&str; 2] = ["hungry", "feed"];

pub const JOKES: [&str; 7] = [
    "Why did the octopus cross the road? To get to the other tide!",
    "What's an octopus's favorite musical instrument? The squeeze-box!",
    "Why are octopuses so smart? They're well-armed for problem solving!",
    "What did one tentacle say to the other? Stop grabbing me!",
    "How do octopuses call each other? With an octo-phone!",
    "What do you call an octopus detective? Sherlock Tentacles!",
    "Why don't octopuses share? They're eight-ful!",
];

pub const SMALLTALK: [&str; 5] = [
    "Blub blub! Tell me another thing.",
    "That's interesting. Do you have a toy?",
    "I like your hat! (I don't really see hats but I pretend)",
    "Ooh, that makes my tentacles tingle!",
    "You're fun! What else can we talk about?",
];

pub const HUNGRY_HINT: &str = "I could use a snack! Try the Feed key.";
pub const FED_REPLY: &str = "Mmm... thanks! More please later :)";
pub const TOY_REPLY: &str = "Yay! Toys are the best, squishy!";
pub const RESET_LINE: &str = "Octopus is refreshed and ready!";
pub const GREETING: &str =
    "Say hi to your octopus! Try feeding it or asking for a joke (type \"joke\").";

/// Returns `None` for blank input.
pub fn classify(text: &str) -> Option<ChatIntent> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    if JOKE_WORDS.iter().any(|w| lower.contains(w)) {
        Some(ChatIntent::Joke)
    } else if HUNGRY_WORDS.iter().any(|w| lower.contains(w)) {
        Some(ChatIntent::Hungry)
    } else {
        Some(ChatIntent::Smalltalk)
    }
}

impl ChatIntent {
    pub fn reply<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        let pool: &[&'static str] = match self {
            ChatIntent::Joke => &JOKES,
            ChatIntent::Hungry => return HUNGRY_HINT,
            ChatIntent::Smalltalk => &SMALLTALK,
        };
        pool.choose(rng).copied().unwrap_or(SMALLTALK[0])
    }

    /// How long the octopus "thinks" before answering.
    pub fn reply_delay(&self) -> Duration {
        match self {
            ChatIntent::Hungry => Duration::from_millis(500),
            ChatIntent::Joke | ChatIntent::Smalltalk => Duration::from_millis(600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn keywords_pick_intent() {
        assert_eq!(classify("tell me a JOKE"), Some(ChatIntent::Joke));
        assert_eq!(classify("that's funny"), Some(ChatIntent::Joke));
        assert_eq!(classify("make me laugh"), Some(ChatIntent::Joke));
        assert_eq!(classify("are you hungry?"), Some(ChatIntent::Hungry));
        assert_eq!(classify("should I feed you"), Some(ChatIntent::Hungry));
        assert_eq!(classify("hello there"), Some(ChatIntent::Smalltalk));
    }

    #[test]
    fn joke_wins_over_hunger() {
        assert_eq!(classify("a funny thing about being hungry"), Some(ChatIntent::Joke));
    }

    #[test]
    fn blank_is_ignored() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("   \t"), None);
    }

    #[test]
    fn replies_come_from_the_right_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert!(JOKES.contains(&ChatIntent::Joke.reply(&mut rng)));
            assert!(SMALLTALK.contains(&ChatIntent::Smalltalk.reply(&mut rng)));
        }
        assert_eq!(ChatIntent::Hungry.reply(&mut rng), HUNGRY_HINT);
        assert!(ChatIntent::Hungry.reply_delay() < ChatIntent::Joke.reply_delay());
    }
}
