//! Password-reset sub-flow: email → otp → new password → success.
//!
//! The one-time code lives only in memory for the lifetime of the sub-flow.
//! There is no attempt limit, no expiry and no resend cooldown; this is
//! demo-grade and not a security boundary.

use rand::Rng;
use serde::Serialize;

pub const CODE_LEN: usize = 6;

/// A uniformly random code in `[100000, 999999]`.
pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(100_000u32..=999_999).to_string()
}

/// The code the user has to type back.
#[derive(Debug, Clone, Serialize)]
pub struct OtpChallenge {
    target_email: String,
    #[serde(skip_serializing)]
    expected_code: String,
    failed_attempts: u32,
    resends: u32,
}

impl OtpChallenge {
    pub fn generate(target_email: &str) -> Self {
        Self::with_code(target_email, random_code(&mut rand::thread_rng()))
    }

    pub fn with_code(target_email: &str, expected_code: String) -> Self {
        Self {
            target_email: target_email.to_string(),
            expected_code,
            failed_attempts: 0,
            resends: 0,
        }
    }

    /// Replaces the code; the previous one stops matching.
    pub fn regenerate(&mut self) {
        self.expected_code = random_code(&mut rand::thread_rng());
        self.resends += 1;
    }

    pub fn matches(&self, entered: &str) -> bool {
        self.expected_code == entered
    }

    pub fn record_failure(&mut self) {
        self.failed_attempts += 1;
    }

    pub fn target_email(&self) -> &str {
        &self.target_email
    }

    pub fn expected_code(&self) -> &str {
        &self.expected_code
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn resends(&self) -> u32 {
        self.resends
    }
}

/// Six single-digit input boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OtpInput {
    digits: [Option<char>; CODE_LEN],
}

impl OtpInput {
    /// Lays `code` out one character per box. Anything that is not a digit
    /// leaves its box empty. `None` when `code` is longer than the boxes.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.chars().count() > CODE_LEN {
            return None;
        }
        let mut input = Self::default();
        for (index, c) in code.chars().enumerate() {
            input.digits[index] = c.is_ascii_digit().then_some(c);
        }
        Some(input)
    }

    /// Sets box `index` from a text change. Only the last typed character is
    /// kept; an empty value clears the box. Returns false when the change was
    /// ignored (index out of range or not a digit).
    pub fn set_digit(&mut self, index: usize, value: &str) -> bool {
        let Some(slot) = self.digits.get_mut(index) else {
            return false;
        };
        match value.chars().last() {
            None => {
                *slot = None;
                true
            }
            Some(c) if c.is_ascii_digit() => {
                *slot = Some(c);
                true
            }
            Some(_) => false,
        }
    }

    /// The full code, once every box holds a digit.
    pub fn code(&self) -> Option<String> {
        self.digits.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.digits = [None; CODE_LEN];
    }

    pub fn is_empty(&self) -> bool {
        self.digits.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ResetPhase {
    Email {
        email: String,
    },
    Otp {
        challenge: OtpChallenge,
        input: OtpInput,
    },
    NewPassword {
        email: String,
    },
    Success,
}

impl ResetPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Email { .. } => "email",
            Self::Otp { .. } => "otp",
            Self::NewPassword { .. } => "new_password",
            Self::Success => "success",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn codes_are_six_digits_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let code = random_code(&mut rng);
            assert_eq!(code.len(), CODE_LEN);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn regenerate_invalidates_previous_code() {
        let mut challenge = OtpChallenge::with_code("ian@example.com", "123456".to_string());
        challenge.regenerate();
        // A fresh draw may repeat the old value with probability 1/900000;
        // the resend counter is the deterministic signal.
        assert_eq!(challenge.resends(), 1);
        assert_eq!(challenge.expected_code().len(), CODE_LEN);
    }

    #[test]
    fn expected_code_is_never_serialized() {
        let challenge = OtpChallenge::with_code("ian@example.com", "482913".to_string());
        let json = serde_json::to_string(&challenge).unwrap();
        assert!(!json.contains("482913"));
        assert!(json.contains("ian@example.com"));
    }

    #[test]
    fn input_keeps_last_typed_character() {
        let mut input = OtpInput::default();
        assert!(input.set_digit(0, "1"));
        assert!(input.set_digit(0, "12"));
        assert_eq!(Some(input.clone()), OtpInput::from_code("2"));
        assert!(input.set_digit(0, ""));
        assert!(input.is_empty());
    }

    #[test]
    fn input_rejects_non_digits_and_bad_indexes() {
        let mut input = OtpInput::default();
        assert!(!input.set_digit(0, "a"));
        assert!(!input.set_digit(CODE_LEN, "1"));
        assert!(input.is_empty());
    }

    #[test]
    fn overlong_codes_do_not_fit() {
        assert_eq!(OtpInput::from_code("1234567"), None);
        assert_eq!(OtpInput::from_code("123456 7"), None);
    }

    #[test]
    fn code_requires_every_box() {
        assert_eq!(OtpInput::from_code("12345").unwrap().code(), None);
        assert_eq!(OtpInput::from_code("12a456").unwrap().code(), None);
        assert_eq!(
            OtpInput::from_code(" 123456 ").unwrap().code().as_deref(),
            Some("123456")
        );

        let mut input = OtpInput::from_code("123456").unwrap();
        input.clear();
        assert!(input.is_empty());
    }
}
