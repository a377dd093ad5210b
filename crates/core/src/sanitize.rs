use serde::Serialize;

pub const MIN_INPUT_CHARS: usize = 8;
pub const KEY_SMASH_RUN: usize = 5;
pub const MIN_LETTER_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizerVerdict {
    Valid,
    TooShort,
    NoLetters,
    KeySmash,
    LowLetterRatio,
}

impl SanitizerVerdict {
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::TooShort => "too_short",
            Self::NoLetters => "no_letters",
            Self::KeySmash => "key_smash",
            Self::LowLetterRatio => "low_letter_ratio",
        }
    }
}

/// Runs the heuristic rules in order and reports the first one that fires.
pub fn inspect_input(input: &str) -> SanitizerVerdict {
    let text = input.trim();
    let total = text.chars().count();

    if total < MIN_INPUT_CHARS {
        return SanitizerVerdict::TooShort;
    }

    if !text
        .chars()
        .any(|ch| is_plan_letter(ch) || ch.is_ascii_digit())
    {
        return SanitizerVerdict::NoLetters;
    }

    if longest_run(text) >= KEY_SMASH_RUN {
        return SanitizerVerdict::KeySmash;
    }

    let letters = text.chars().filter(|ch| is_plan_letter(*ch)).count();
    if (letters as f64) / (total.max(1) as f64) < MIN_LETTER_RATIO {
        return SanitizerVerdict::LowLetterRatio;
    }

    SanitizerVerdict::Valid
}

pub fn is_probably_gibberish(input: &str) -> bool {
    !inspect_input(input).is_valid()
}

/// ASCII letters plus the Thai block from KO KAI to the last Thai digit.
fn is_plan_letter(ch: char) -> bool {
    let code = ch as u32;
    ch.is_ascii_alphabetic() || (0x0E01..=0x0E59).contains(&code)
}

// Newlines break a run.
fn longest_run(text: &str) -> usize {
    let mut longest = 0usize;
    let mut current = 0usize;
    let mut previous: Option<char> = None;

    for ch in text.chars() {
        if ch == '\n' {
            current = 0;
            previous = None;
            continue;
        }
        current = if previous == Some(ch) { current + 1 } else { 1 };
        previous = Some(ch);
        longest = longest.max(current);
    }

    longest
}
