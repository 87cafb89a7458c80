//! Decoder configuration.

/// Expectations the decoder checks traffic against.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Config {
    /// Channel id every inner block header must carry.
    pub expected_channel: u16,
}

impl Config {
    /// Create a new [`Config`] expecting the given channel.
    #[inline]
    #[must_use]
    pub fn new(expected_channel: u16) -> Self {
        Self { expected_channel }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL)
    }
}

/// Channel id expected when nothing else is configured.
pub const DEFAULT_CHANNEL: u16 = 7;

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn default_expects_channel_seven() {
        assert_eq!(Config::default().expected_channel, 7);
        assert_eq!(Config::new(3).expected_channel, 3);
    }
}
