// Haseq Config Validation
// Cross-definition checks on a parsed configuration

use std::collections::HashSet;
use std::fmt;

use crate::config::Config;

/// Minimum accepted inter-key timeout.
pub const MIN_TIMEOUT_MS: u64 = 100;

/// Timeouts below this drain the battery with extra input polling.
const SHORT_TIMEOUT_MS: u64 = 1500;
/// Timeouts above this leave stale partial sequences around too long.
const LONG_TIMEOUT_MS: u64 = 10_000;
/// Sequences longer than this are hard to enter reliably on a watch.
const MAX_COMFORTABLE_KEYS: usize = 5;
/// More sequences than this are hard to memorize.
const MAX_COMFORTABLE_SEQUENCES: usize = 10;

/// Hard errors: a configuration with any of these must not reach the
/// matcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'sequences' array cannot be empty")]
    NoSequences,

    #[error("sequence {index}: 'id' must be a non-empty string")]
    EmptyId { index: usize },

    #[error("sequence '{id}': duplicate id")]
    DuplicateId { id: String },

    #[error("sequence '{id}': key sequence cannot be empty")]
    EmptySequence { id: String },

    #[error("sequence '{id}': timeout must be at least {MIN_TIMEOUT_MS} ms (got {timeout_ms})")]
    TimeoutTooShort { id: String, timeout_ms: u64 },

    #[error("sequence '{id}': action '{service}' must be in 'domain.service' form")]
    InvalidService { id: String, service: String },

    #[error("sequence '{id}': action entity cannot be empty")]
    EmptyEntity { id: String },

    #[error("sequences '{first}' and '{second}' share the exact same key chain")]
    DuplicateSequence { first: String, second: String },
}

/// Advisory findings: the configuration still loads, but behaves or drains
/// worse than it could.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// A shorter sequence shadows a longer one, making it unreachable
    PrefixCollision { shorter: String, longer: String },

    /// Timeout below the battery-friendly threshold
    ShortTimeout { id: String, timeout_ms: u64 },

    /// Timeout long enough to frustrate users
    LongTimeout { id: String, timeout_ms: u64 },

    /// Key chain longer than is comfortable to enter
    LongSequence { id: String, len: usize },

    /// More sequences than is comfortable to memorize
    ManySequences { count: usize },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::PrefixCollision { shorter, longer } => write!(
                f,
                "sequence '{shorter}' is a prefix of '{longer}', which can never complete"
            ),
            ValidationWarning::ShortTimeout { id, timeout_ms } => write!(
                f,
                "sequence '{id}': timeout {timeout_ms} ms is quite short, consider >= {SHORT_TIMEOUT_MS} ms for better battery life"
            ),
            ValidationWarning::LongTimeout { id, timeout_ms } => write!(
                f,
                "sequence '{id}': timeout {timeout_ms} ms is very long, users may find it frustrating"
            ),
            ValidationWarning::LongSequence { id, len } => write!(
                f,
                "sequence '{id}': {len} keys is quite long, 2-4 keys are easier to enter"
            ),
            ValidationWarning::ManySequences { count } => write!(
                f,
                "{count} sequences configured, consider reducing to {MAX_COMFORTABLE_SEQUENCES} or fewer"
            ),
        }
    }
}

/// Everything found in one validation pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// True when no hard errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Config {
    /// Validate every definition, collecting all errors and warnings in one
    /// pass rather than stopping at the first problem.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.sequences.is_empty() {
            report.errors.push(ValidationError::NoSequences);
            return report;
        }

        let mut seen_ids: HashSet<&str> = HashSet::new();
        for (index, def) in self.sequences.iter().enumerate() {
            if def.id.trim().is_empty() {
                report.errors.push(ValidationError::EmptyId { index });
            } else if !seen_ids.insert(def.id.as_str()) {
                report.errors.push(ValidationError::DuplicateId {
                    id: def.id.clone(),
                });
            }

            if def.keys.is_empty() {
                report.errors.push(ValidationError::EmptySequence {
                    id: def.id.clone(),
                });
            } else if def.keys.len() > MAX_COMFORTABLE_KEYS {
                report.warnings.push(ValidationWarning::LongSequence {
                    id: def.id.clone(),
                    len: def.keys.len(),
                });
            }

            if def.timeout_ms < MIN_TIMEOUT_MS {
                report.errors.push(ValidationError::TimeoutTooShort {
                    id: def.id.clone(),
                    timeout_ms: def.timeout_ms,
                });
            } else if def.timeout_ms < SHORT_TIMEOUT_MS {
                report.warnings.push(ValidationWarning::ShortTimeout {
                    id: def.id.clone(),
                    timeout_ms: def.timeout_ms,
                });
            } else if def.timeout_ms > LONG_TIMEOUT_MS {
                report.warnings.push(ValidationWarning::LongTimeout {
                    id: def.id.clone(),
                    timeout_ms: def.timeout_ms,
                });
            }

            if !def.action.has_valid_service() {
                report.errors.push(ValidationError::InvalidService {
                    id: def.id.clone(),
                    service: def.action.service.clone(),
                });
            }
            if def.action.entity.trim().is_empty() {
                report.errors.push(ValidationError::EmptyEntity {
                    id: def.id.clone(),
                });
            }
        }

        if self.sequences.len() > MAX_COMFORTABLE_SEQUENCES {
            report.warnings.push(ValidationWarning::ManySequences {
                count: self.sequences.len(),
            });
        }

        // Pairwise prefix analysis. An identical chain is an error (only the
        // first definition could ever win); a strict prefix leaves the longer
        // sequence unreachable but is tolerated.
        for (i, a) in self.sequences.iter().enumerate() {
            for b in self.sequences.iter().skip(i + 1) {
                if a.keys.is_empty() || b.keys.is_empty() {
                    continue;
                }
                if a.keys == b.keys {
                    report.errors.push(ValidationError::DuplicateSequence {
                        first: a.id.clone(),
                        second: b.id.clone(),
                    });
                } else if b.keys.starts_with(&a.keys) {
                    report.warnings.push(ValidationWarning::PrefixCollision {
                        shorter: a.id.clone(),
                        longer: b.id.clone(),
                    });
                } else if a.keys.starts_with(&b.keys) {
                    report.warnings.push(ValidationWarning::PrefixCollision {
                        shorter: b.id.clone(),
                        longer: a.id.clone(),
                    });
                }
            }
        }

        log::debug!(
            "validation found {} error(s), {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        );
        report
    }
}
