use tracing::{debug, info};

use crate::profiles::KeyProfile;
use crate::types::{Key, KeyMode, KeyRegion};

/// One of the 24 keys with its correlation against a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyCandidate {
    pub key: Key,
    pub correlation: f64,
}

/// Correlations of a single window against all 24 rotated profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEstimate {
    pub best: KeyCandidate,
    pub second: KeyCandidate,
    /// `(best.r + 1) / 2`
    pub confidence: f64,
    /// Near 1 when the two strongest keys are nearly tied.
    pub ambiguity: f64,
    major: [f64; 12],
    minor: [f64; 12],
}

impl KeyEstimate {
    /// Correlation of `key` in the same window.
    pub fn correlation(&self, key: Key) -> f64 {
        match key.mode() {
            KeyMode::Major => self.major[key.tonic() as usize],
            KeyMode::Minor => self.minor[key.tonic() as usize],
        }
    }

    /// `(r + 1) / 2` for `key` in this window.
    pub fn confidence_of(&self, key: Key) -> f64 {
        correlation_to_confidence(self.correlation(key))
    }
}

pub fn correlation_to_confidence(r: f64) -> f64 {
    ((r + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Estimate the key of one histogram. `None` when the window has no energy.
///
/// Keys are enumerated tonic-ascending with major before minor; a later key
/// must correlate strictly higher to displace an earlier one.
pub fn estimate_key(histogram: &[f64; 12], profile: &KeyProfile) -> Option<KeyEstimate> {
    let total: f64 = histogram.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut major = [0.0_f64; 12];
    let mut minor = [0.0_f64; 12];
    let mut best = KeyCandidate {
        key: Key::major(0),
        correlation: f64::NEG_INFINITY,
    };
    let mut second = best;

    for tonic in 0..12u8 {
        // Rotate histogram so tonic = index 0
        let mut rotated = [0.0; 12];
        for (i, slot) in rotated.iter_mut().enumerate() {
            *slot = histogram[(i + tonic as usize) % 12];
        }

        major[tonic as usize] = pearson(&rotated, &profile.major);
        minor[tonic as usize] = pearson(&rotated, &profile.minor);

        for candidate in [
            KeyCandidate {
                key: Key::major(tonic),
                correlation: major[tonic as usize],
            },
            KeyCandidate {
                key: Key::minor(tonic),
                correlation: minor[tonic as usize],
            },
        ] {
            if candidate.correlation > best.correlation {
                second = best;
                best = candidate;
            } else if candidate.correlation > second.correlation {
                second = candidate;
            }
        }
    }

    let gap = (best.correlation - second.correlation).max(0.0);
    let ambiguity = 1.0 - (2.0 * gap / (best.correlation.abs() + 1e-9)).clamp(0.0, 1.0);

    Some(KeyEstimate {
        best,
        second,
        confidence: correlation_to_confidence(best.correlation),
        ambiguity,
        major,
        minor,
    })
}

/// Pearson correlation coefficient between two 12-element vectors.
pub fn pearson(x: &[f64; 12], y: &[f64; 12]) -> f64 {
    let n = 12.0;
    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for i in 0..12 {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    cov / denom
}

/// Running statistics for a region that has not been closed yet.
#[derive(Debug, Clone)]
struct OpenRegion {
    key: Key,
    start: f64,
    confidence_sum: f64,
    ambiguity_sum: f64,
    windows: usize,
}

impl OpenRegion {
    fn new(key: Key, start: f64) -> Self {
        Self {
            key,
            start,
            confidence_sum: 0.0,
            ambiguity_sum: 0.0,
            windows: 0,
        }
    }

    fn absorb(&mut self, confidence: f64, ambiguity: f64) {
        self.confidence_sum += confidence;
        self.ambiguity_sum += ambiguity;
        self.windows += 1;
    }

    fn close(&self, end: f64) -> KeyRegion {
        let (confidence, ambiguity) = if self.windows == 0 {
            (0.0, 1.0)
        } else {
            let n = self.windows as f64;
            (self.confidence_sum / n, self.ambiguity_sum / n)
        };
        KeyRegion {
            tonic: self.key.tonic(),
            mode: self.key.mode(),
            confidence,
            ambiguity,
            start: self.start,
            end,
        }
    }
}

/// A window that agreed with a pending key, scored under both keys.
#[derive(Debug, Clone, Copy)]
struct PendingWindow {
    current_confidence: f64,
    candidate_confidence: f64,
    ambiguity: f64,
}

#[derive(Debug, Clone)]
struct PendingChange {
    key: Key,
    first_anchor: f64,
    windows: Vec<PendingWindow>,
}

/// A committed key change.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCommit {
    /// The region that just ended.
    pub closed: KeyRegion,
    pub new_key: Key,
    /// Back-dated to the first agreeing window.
    pub start: f64,
}

/// Hysteresis over successive window estimates.
///
/// A key change commits only after `min_stable_windows` consecutive windows
/// whose best key is the same candidate and whose confidence exceeds the
/// current key's confidence, in the same window, by at least `threshold`.
/// A silent or disagreeing window resets the count.
#[derive(Debug, Clone)]
pub struct KeyTracker {
    extent_start: f64,
    min_stable_windows: usize,
    threshold: f64,
    current: Option<OpenRegion>,
    pending: Option<PendingChange>,
    closed: Vec<KeyRegion>,
}

impl KeyTracker {
    pub fn new(extent_start: f64, min_stable_windows: usize, threshold: f64) -> Self {
        Self {
            extent_start,
            min_stable_windows: min_stable_windows.max(1),
            threshold,
            current: None,
            pending: None,
            closed: Vec::new(),
        }
    }

    /// Feed the estimate of the next hop. Returns the commit, if any.
    pub fn push(&mut self, anchor: f64, estimate: Option<&KeyEstimate>) -> Option<KeyCommit> {
        let Some(estimate) = estimate else {
            debug!(anchor, "silent key window");
            self.abandon_pending();
            return None;
        };

        debug!(
            anchor,
            key = %estimate.best.key,
            r = estimate.best.correlation,
            ambiguity = estimate.ambiguity,
            "key window"
        );

        let Some(current_key) = self.current_key() else {
            // Leading silence is absorbed by the first estimated key.
            let mut region = OpenRegion::new(estimate.best.key, self.extent_start);
            region.absorb(estimate.confidence, estimate.ambiguity);
            self.current = Some(region);
            return None;
        };

        let candidate = estimate.best.key;
        let margin = estimate.confidence_of(candidate) - estimate.confidence_of(current_key);

        if candidate == current_key || margin < self.threshold {
            self.abandon_pending();
            if let Some(current) = self.current.as_mut() {
                current.absorb(estimate.confidence_of(current_key), estimate.ambiguity);
            }
            return None;
        }

        let window = PendingWindow {
            current_confidence: estimate.confidence_of(current_key),
            candidate_confidence: estimate.confidence_of(candidate),
            ambiguity: estimate.ambiguity,
        };

        match self.pending.as_mut() {
            Some(pending) if pending.key == candidate => pending.windows.push(window),
            _ => {
                self.abandon_pending();
                self.pending = Some(PendingChange {
                    key: candidate,
                    first_anchor: anchor,
                    windows: vec![window],
                });
            }
        }

        let stable = self
            .pending
            .as_ref()
            .is_some_and(|p| p.windows.len() >= self.min_stable_windows);
        if stable {
            self.commit()
        } else {
            None
        }
    }

    fn commit(&mut self) -> Option<KeyCommit> {
        let pending = self.pending.take()?;
        let previous = self.current.take()?;

        let closed = previous.close(pending.first_anchor);
        let mut region = OpenRegion::new(pending.key, pending.first_anchor);
        for window in &pending.windows {
            region.absorb(window.candidate_confidence, window.ambiguity);
        }

        info!(
            from = %previous.key,
            to = %pending.key,
            at = pending.first_anchor,
            "key change committed"
        );

        self.current = Some(region);
        self.closed.push(closed.clone());

        Some(KeyCommit {
            closed,
            new_key: pending.key,
            start: pending.first_anchor,
        })
    }

    /// A pending change that broke off stays in the current key.
    fn abandon_pending(&mut self) {
        if let (Some(pending), Some(current)) = (self.pending.take(), self.current.as_mut()) {
            for window in pending.windows {
                current.absorb(window.current_confidence, window.ambiguity);
            }
        }
    }

    /// The key in force now, ignoring any uncommitted candidate.
    pub fn current_key(&self) -> Option<Key> {
        self.current.as_ref().map(|r| r.key)
    }

    /// Key active at `time` under the regions decided so far.
    pub fn key_at(&self, time: f64) -> Option<Key> {
        if let Some(current) = &self.current {
            if time >= current.start {
                return Some(current.key);
            }
        }
        crate::types::key_at(&self.closed, time).or_else(|| self.current_key())
    }

    /// Regions closed by commits so far.
    pub fn closed_regions(&self) -> &[KeyRegion] {
        &self.closed
    }

    /// Close the timeline at `end`. Leaves one default region when no window
    /// ever had energy.
    pub fn finish(mut self, end: f64) -> Vec<KeyRegion> {
        self.abandon_pending();
        let current = self
            .current
            .take()
            .unwrap_or_else(|| OpenRegion::new(Key::default(), self.extent_start));
        self.closed.push(current.close(end.max(current.start)));
        self.closed
    }
}
