// Haseq Sequence Matcher
// Turns a stream of key presses into completed sequence matches

use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::{KeyCode, SequenceDefinition, DEFAULT_TIMEOUT_MS};

/// Outcome of feeding one key to the matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The key completed this configured sequence; the buffer was cleared
    Completed(SequenceDefinition),

    /// The buffer is a strict prefix of the sequences with these ids
    /// (configuration order); the buffer is retained
    Partial(Vec<String>),

    /// No configured sequence starts with the buffer; it was cleared
    NoMatch,
}

/// Discrete-event matcher over a loaded sequence set.
///
/// Holds the keys pressed since the last reset and the time the last key was
/// accepted. Timeout abandonment is a lazy elapsed-time comparison performed
/// on the next key press; nothing fires spontaneously, so the matcher is
/// fully deterministic under test without real time passing. The caller owns
/// the matcher and must deliver keys in the order they occurred.
pub struct SequenceMatcher {
    definitions: Vec<SequenceDefinition>,
    default_timeout: Duration,
    buffer: SmallVec<[KeyCode; 8]>,
    last_key_at: Option<Instant>,
}

impl SequenceMatcher {
    /// Create a matcher over validated definitions.
    pub fn new(definitions: Vec<SequenceDefinition>) -> Self {
        Self::with_default_timeout(definitions, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Create a matcher with an explicit fallback timeout, used when the
    /// buffer is a prefix of no definition.
    pub fn with_default_timeout(
        definitions: Vec<SequenceDefinition>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            definitions,
            default_timeout,
            buffer: SmallVec::new(),
            last_key_at: None,
        }
    }

    /// The active definitions, in configuration order.
    pub fn definitions(&self) -> &[SequenceDefinition] {
        &self.definitions
    }

    /// Keys accepted since the last reset, for status display.
    pub fn buffer(&self) -> &[KeyCode] {
        &self.buffer
    }

    /// Discard any partially entered sequence.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Feed one key press observed at `now`.
    ///
    /// A buffer older than its tolerance window is abandoned silently before
    /// the new key is considered, so a stale prefix never contaminates a
    /// fresh attempt. A key that matches nothing clears the buffer and is
    /// itself discarded: it is not retried as the start of a new one-key
    /// sequence, and the next press starts from empty.
    pub fn handle_key(&mut self, key: KeyCode, now: Instant) -> MatchOutcome {
        if !self.buffer.is_empty() {
            if let Some(last) = self.last_key_at {
                let window = self.applicable_timeout();
                if now.duration_since(last) > window {
                    log::debug!(
                        "abandoning stale buffer [{}] after {:?}",
                        self.render_buffer(),
                        window
                    );
                    self.buffer.clear();
                }
            }
        }

        self.buffer.push(key);
        self.last_key_at = Some(now);

        let mut exact: Option<usize> = None;
        let mut partial_ids: Vec<String> = Vec::new();
        for (index, def) in self.definitions.iter().enumerate() {
            if !def.keys.starts_with(&self.buffer) {
                continue;
            }
            if def.keys.len() == self.buffer.len() {
                // First definition in configuration order wins should
                // duplicate chains ever get past validation.
                if exact.is_none() {
                    exact = Some(index);
                }
            } else {
                partial_ids.push(def.id.clone());
            }
        }

        if let Some(index) = exact {
            let def = self.definitions[index].clone();
            log::debug!("sequence '{}' completed", def.id);
            self.buffer.clear();
            return MatchOutcome::Completed(def);
        }

        if !partial_ids.is_empty() {
            log::debug!("partial sequence [{}]", self.render_buffer());
            return MatchOutcome::Partial(partial_ids);
        }

        log::debug!(
            "no sequence starts with [{}], resetting",
            self.render_buffer()
        );
        self.buffer.clear();
        MatchOutcome::NoMatch
    }

    /// Tolerance window for the current buffer: the minimum timeout among
    /// definitions the buffer could still complete, or the fallback when it
    /// matches nothing.
    fn applicable_timeout(&self) -> Duration {
        self.definitions
            .iter()
            .filter(|def| def.keys.starts_with(&self.buffer))
            .map(|def| def.timeout())
            .min()
            .unwrap_or(self.default_timeout)
    }

    fn render_buffer(&self) -> String {
        self.buffer
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join("-")
    }
}
