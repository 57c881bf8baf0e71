//! Completion detection for remotely rendered output that grows over time
//! and never signals when it is done.
//!
//! The worker samples the rendering at a fixed interval and feeds each sample
//! to a [`CompletionStrategy`]. The built-in [`StabilityDetector`] declares
//! completion once the sample has stopped changing for a configured number of
//! consecutive samples, or earlier when an optional end marker shows up and a
//! short confirmation run agrees. A hard ceiling on the number of samples turns
//! a rendering that never settles into [`Verdict::TimedOut`], never into a
//! truncated success.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Samples shorter than this (in characters) are treated as placeholder noise
/// and never count toward stability.
pub const DEFAULT_MIN_LENGTH: usize = 100;

/// Default time between two samples.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Stable samples needed to confirm a completion once the end marker is seen.
pub const DEFAULT_MARKER_CONFIRMATIONS: u32 = 2;

/// Marker the intermittent profile asks the generator to emit when done.
pub const DEFAULT_END_MARKER: &str = "===END===";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What is compared between consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMetric {
    /// Character count.
    #[default]
    Length,
    /// SHA-256 of the full sample.
    ContentHash,
}

impl std::str::FromStr for SampleMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length" => Ok(Self::Length),
            "content_hash" => Ok(Self::ContentHash),
            other => Err(format!("unknown sample metric '{other}'")),
        }
    }
}

/// Tuning for a [`StabilityDetector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityConfig {
    /// Time between samples.
    pub interval: Duration,
    /// Hard ceiling on samples before giving up.
    pub max_samples: u32,
    /// Consecutive unchanged samples required to declare completion.
    pub required_stable: u32,
    /// Noise threshold in characters.
    pub min_length: usize,
    /// Optional in-band completion marker.
    pub end_marker: Option<String>,
    /// Stable samples required once the marker is present.
    pub marker_confirmations: u32,
    pub metric: SampleMetric,
}

impl StabilityConfig {
    /// Generators that stream quickly and settle once: six stable samples,
    /// give up after 600.
    pub fn fast_settling() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_samples: 600,
            required_stable: 6,
            min_length: DEFAULT_MIN_LENGTH,
            end_marker: None,
            marker_confirmations: DEFAULT_MARKER_CONFIRMATIONS,
            metric: SampleMetric::Length,
        }
    }

    /// Generators that pause mid-output: fifteen stable samples, give up after
    /// 1200, with an end marker as the fast path.
    pub fn intermittent() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_samples: 1200,
            required_stable: 15,
            min_length: DEFAULT_MIN_LENGTH,
            end_marker: Some(DEFAULT_END_MARKER.to_string()),
            marker_confirmations: DEFAULT_MARKER_CONFIRMATIONS,
            metric: SampleMetric::Length,
        }
    }

    /// Look up a named profile.
    pub fn profile(name: &str) -> Option<Self> {
        match name {
            "fast_settling" => Some(Self::fast_settling()),
            "intermittent" => Some(Self::intermittent()),
            _ => None,
        }
    }

    /// Worst-case time spent sampling before a timeout.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_samples
    }

    /// Final text with the end marker (if any) removed and whitespace trimmed.
    pub fn clean_output(&self, content: &str) -> String {
        match self.end_marker.as_deref() {
            Some(marker) if !marker.is_empty() => content.replace(marker, "").trim().to_string(),
            _ => content.trim().to_string(),
        }
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self::fast_settling()
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Why a strategy declared completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The sample stopped changing.
    Plateau,
    /// The end marker appeared and was confirmed.
    EndMarker,
}

/// Outcome of feeding one sample to a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Complete {
        reason: CompletionReason,
        samples: u32,
    },
    TimedOut {
        samples: u32,
    },
}

impl Verdict {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Decides, one sample at a time, whether an evolving output is finished.
pub trait CompletionStrategy: Send {
    /// Time to wait before taking the next sample.
    fn interval(&self) -> Duration;

    /// Feed the latest sample.
    fn observe(&mut self, sample: &str) -> Verdict;

    /// Record a sampling attempt that produced nothing readable. Counts toward
    /// the ceiling without touching the stability run.
    fn observe_missing(&mut self) -> Verdict;
}

// ---------------------------------------------------------------------------
// Stability detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fingerprint {
    Length(usize),
    Hash([u8; 32]),
}

/// Plateau detector with an optional end-marker fast path.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    config: StabilityConfig,
    samples: u32,
    stable: u32,
    previous: Option<Fingerprint>,
}

impl StabilityDetector {
    pub fn new(config: StabilityConfig) -> Self {
        Self {
            config,
            samples: 0,
            stable: 0,
            previous: None,
        }
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }

    /// Samples observed so far, including missing ones.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Current run of consecutive unchanged samples.
    pub fn stable_count(&self) -> u32 {
        self.stable
    }

    fn fingerprint(&self, sample: &str, length: usize) -> Fingerprint {
        match self.config.metric {
            SampleMetric::Length => Fingerprint::Length(length),
            SampleMetric::ContentHash => {
                let mut digest = [0u8; 32];
                digest.copy_from_slice(&Sha256::digest(sample.as_bytes()));
                Fingerprint::Hash(digest)
            }
        }
    }

    fn ceiling(&self) -> Verdict {
        if self.samples >= self.config.max_samples {
            Verdict::TimedOut {
                samples: self.samples,
            }
        } else {
            Verdict::Pending
        }
    }

    fn complete(&self, reason: CompletionReason) -> Verdict {
        Verdict::Complete {
            reason,
            samples: self.samples,
        }
    }
}

impl CompletionStrategy for StabilityDetector {
    fn interval(&self) -> Duration {
        self.config.interval
    }

    fn observe(&mut self, sample: &str) -> Verdict {
        self.samples += 1;

        let length = sample.chars().count();
        let fingerprint = self.fingerprint(sample, length);
        let repeated = self.previous.as_ref() == Some(&fingerprint);

        if repeated && length > self.config.min_length {
            self.stable += 1;
        } else {
            self.stable = 0;
        }
        self.previous = Some(fingerprint);

        let marker_seen = self
            .config
            .end_marker
            .as_deref()
            .is_some_and(|marker| sample.contains(marker));

        if marker_seen {
            // The plateau rule is not consulted while the marker is present.
            if self.stable >= self.config.marker_confirmations {
                return self.complete(CompletionReason::EndMarker);
            }
        } else if self.stable >= self.config.required_stable {
            return self.complete(CompletionReason::Plateau);
        }

        self.ceiling()
    }

    fn observe_missing(&mut self) -> Verdict {
        self.samples += 1;
        self.ceiling()
    }
}
