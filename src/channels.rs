//! Channel resolution.
//!
//! Precedence, highest first: channels on the check, channels on the client,
//! the configured defaults. Compulsory channels are unioned into whichever
//! list won. Resolution never fails; the worst case is an empty set, which
//! the handler treats as "nothing to do".

use crate::config::ChannelRouting;
use crate::event::Event;
use std::fmt;

/// Ordered, duplicate-free list of channel identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSet(Vec<String>);

impl ChannelSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a channel, keeping the first-seen position.
    ///
    /// Returns `false` when the channel was already present or blank.
    pub fn insert(&mut self, channel: impl Into<String>) -> bool {
        let channel = channel.into();
        let channel = channel.trim();
        if channel.is_empty() || self.contains(channel) {
            return false;
        }
        self.0.push(channel.to_string());
        true
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.0.iter().any(|c| c == channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> Extend<S> for ChannelSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for channel in iter {
            self.insert(channel);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ChannelSet::new();
        set.extend(iter);
        set
    }
}

impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Which tier supplied the base channel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSource {
    Check,
    Client,
    Default,
    None,
}

impl ChannelSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelSource::Check => "check",
            ChannelSource::Client => "client",
            ChannelSource::Default => "default",
            ChannelSource::None => "none",
        }
    }
}

/// Result of a resolution, with the tier that won for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub channels: ChannelSet,
    pub source: ChannelSource,
}

/// Compute the target channels for an event.
pub fn resolve(event: &Event, routing: &ChannelRouting) -> Resolution {
    let (base, source) = if let Some(channels) = event.check.routed_channels() {
        (channels, ChannelSource::Check)
    } else if let Some(channels) = event.client.routed_channels() {
        (channels, ChannelSource::Client)
    } else if !routing.default.is_empty() {
        (routing.default.clone(), ChannelSource::Default)
    } else {
        (Vec::new(), ChannelSource::None)
    };

    let mut channels: ChannelSet = base.into_iter().collect();
    channels.extend(routing.compulsory.iter().cloned());

    tracing::debug!(
        source = source.as_str(),
        channels = %channels,
        "Resolved target channels"
    );

    Resolution { channels, source }
}
