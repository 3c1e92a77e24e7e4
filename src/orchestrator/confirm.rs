//! Confirmation before each flavor is published.

use std::io::Write;

/// Asks whether to go ahead with a flavor
pub trait Confirm {
    /// `false` skips the flavor
    fn confirm(&self, prompt: &str) -> bool;
}

impl<T: Confirm + ?Sized> Confirm for &T {
    fn confirm(&self, prompt: &str) -> bool {
        (**self).confirm(prompt)
    }
}

/// Always proceeds; used for unattended runs
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Prompts on stdout and reads one line from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} ", prompt);
        if let Err(e) = std::io::stdout().flush() {
            log::warn!("Failed to flush prompt: {}", e);
        }

        let mut input = String::new();
        if let Err(e) = std::io::stdin().read_line(&mut input) {
            log::warn!("Failed to read answer, proceeding: {}", e);
        }
        is_affirmative(&input)
    }
}

/// Only an explicit `n`/`no` declines
pub fn is_affirmative(answer: &str) -> bool {
    !matches!(answer.trim().to_ascii_lowercase().as_str(), "n" | "no")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_explicit_no_declines() {
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(" No \n"));
        assert!(is_affirmative("y"));
        assert!(is_affirmative("YES"));
        assert!(is_affirmative(""));
        assert!(is_affirmative("maybe"));
    }

    #[test]
    fn test_auto_confirm() {
        assert!(AutoConfirm.confirm("Publish app.apk"));
    }
}
