//! Verification code generation.

use keystone_common::constants::{CODE_MAX, CODE_MIN};

/// Produces the plaintext codes handed out by the manager
pub trait CodeSource: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform draw from `CODE_MIN..=CODE_MAX` using the thread-local CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn generate(&self) -> String {
        use rand::Rng;

        rand::rng().random_range(CODE_MIN..=CODE_MAX).to_string()
    }
}

/// Hands out a scripted sequence of codes, then repeats the last one
#[cfg(test)]
#[derive(Debug)]
pub struct FixedCodes {
    queue: std::sync::Mutex<std::collections::VecDeque<String>>,
    last: std::sync::Mutex<String>,
}

#[cfg(test)]
impl FixedCodes {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            queue: std::sync::Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
            last: std::sync::Mutex::new(codes.last().copied().unwrap_or("123456").to_string()),
        }
    }
}

#[cfg(test)]
impl CodeSource for FixedCodes {
    fn generate(&self) -> String {
        match self.queue.lock().unwrap().pop_front() {
            Some(code) => {
                *self.last.lock().unwrap() = code.clone();
                code
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_common::constants::CODE_LENGTH;

    #[test]
    fn test_random_codes_are_six_digits() {
        for _ in 0..1_000 {
            let code = RandomCodes.generate();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            let value: u32 = code.parse().unwrap();
            assert!((CODE_MIN..=CODE_MAX).contains(&value));
        }
    }

    #[test]
    fn test_fixed_codes_sequence() {
        let codes = FixedCodes::new(&["111111", "222222"]);
        assert_eq!(codes.generate(), "111111");
        assert_eq!(codes.generate(), "222222");
        assert_eq!(codes.generate(), "222222");
    }
}
