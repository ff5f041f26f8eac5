use std::time::Duration;

/// Reveals a message one word per tick.
///
/// The driver only knows about ticks; the session owns the timer that calls
/// [`TypewriterDriver::tick`] and stops it once [`TypewriterDriver::is_complete`].
#[derive(Debug, Clone, Default)]
pub struct TypewriterDriver {
    tokens: Vec<String>,
    cursor: usize,
    interval: Duration,
}

impl TypewriterDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the reveal and re-tokenizes `message` on whitespace.
    pub fn start(&mut self, message: &str, interval: Duration) {
        self.tokens = message.split_whitespace().map(str::to_owned).collect();
        self.cursor = 0;
        self.interval = interval;
    }

    /// Advances by one token. Returns false once there is nothing left to reveal.
    pub fn tick(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn current_text(&self) -> String {
        self.tokens[..self.cursor].join(" ")
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.tokens.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(120);

    #[test]
    fn reveals_word_by_word() {
        let mut driver = TypewriterDriver::new();
        driver.start("Will you be my Valentine", INTERVAL);
        assert_eq!(driver.len(), 5);
        assert_eq!(driver.current_text(), "");
        assert!(!driver.is_complete());

        for _ in 0..3 {
            assert!(driver.tick());
        }
        assert_eq!(driver.current_text(), "Will you be");
        assert!(!driver.is_complete());

        driver.tick();
        driver.tick();
        assert_eq!(driver.current_text(), "Will you be my Valentine");
        assert!(driver.is_complete());

        assert!(!driver.tick());
        assert_eq!(driver.cursor(), 5);
    }

    #[test]
    fn collapses_irregular_whitespace() {
        let mut driver = TypewriterDriver::new();
        driver.start("  Dear\n\tfriend,   hello ", INTERVAL);
        while driver.tick() {}
        assert_eq!(driver.current_text(), "Dear friend, hello");
    }

    #[test]
    fn empty_message_is_complete_immediately() {
        let mut driver = TypewriterDriver::new();
        driver.start("   ", INTERVAL);
        assert!(driver.is_empty());
        assert!(driver.is_complete());
        assert!(!driver.tick());
        assert_eq!(driver.current_text(), "");
    }

    #[test]
    fn restart_resets_progress() {
        let mut driver = TypewriterDriver::new();
        driver.start("one two", INTERVAL);
        driver.tick();
        driver.tick();
        assert!(driver.is_complete());

        driver.start("three four five", INTERVAL);
        assert_eq!(driver.current_text(), "");
        assert!(!driver.is_complete());
        assert_eq!(driver.len(), 3);
    }
}
