//! Notifier that prints messages instead of sending them.

use crate::notify::{Notifier, NotifyError};

/// Prints every message to stdout. Used for dry runs and offline replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        println!("---- notification ----");
        println!("{message}");
        println!("----------------------");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_notifier_always_succeeds() {
        assert_eq!(ConsoleNotifier.send("hello"), Ok(()));
    }
}
