use rand::seq::SliceRandom;
use rand::Rng;
use unicode_normalization::UnicodeNormalization;

pub const MAX_USERNAME_LEN: usize = 15;
pub const MIN_USERNAME_LEN: usize = 3;

const WORDS: &[&str] = &[
    "striker", "keeper", "volley", "header", "dribble", "corner", "penalty", "tackle",
    "rebound", "slam", "dunk", "serve", "smash", "racket", "sprint", "relay", "hurdle",
    "pitch", "derby", "rally", "champ", "medal", "trophy", "arena", "stadium", "winger",
    "sweeper", "captain", "rookie", "legend", "maverick", "comet", "falcon", "tiger",
    "panther", "rocket", "blaze", "thunder", "storm", "glory",
];

/// Turns a display name into a username: diacritics and compatibility
/// forms (ligatures, full-width letters) are folded to ASCII,
/// everything outside `[a-z0-9]` is dropped, leading digits are stripped and
/// the result is cut to 15 characters. Names that leave fewer than three
/// usable characters get a generated name instead.
pub fn generate_username(name: &str) -> String {
    let folded: String = name
        .nfkd()
        .filter(char::is_ascii)
        .flat_map(|c| c.to_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    let candidate: String = folded
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .chars()
        .take(MAX_USERNAME_LEN)
        .collect();

    if candidate.len() < MIN_USERNAME_LEN {
        generate_proper_name()
    } else {
        candidate
    }
}

/// A random word from the list followed by up to two digits.
pub fn generate_proper_name() -> String {
    generate_proper_name_with(&mut rand::thread_rng())
}

pub fn generate_proper_name_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let words: Vec<&str> = WORDS
        .iter()
        .copied()
        .filter(|w| (4..=8).contains(&w.len()))
        .collect();
    let word = words.choose(rng).copied().unwrap_or("champ");
    let digits = rng.gen_range(0..=2);

    let mut name = word.to_string();
    for _ in 0..digits {
        name.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    name
}
