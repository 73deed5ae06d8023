//! Internal implementation of identifier and clock services.

use crate::{UuidError, UuidResult};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Medex's canonical identifier representation (32 lowercase hex characters,
/// no hyphens).
///
/// This wrapper type guarantees that once constructed, the contained UUID is
/// in canonical format. Resource and bundle identifiers are derived from it by
/// prepending a kind prefix (`pat-`, `cond-`, `proc-`, `obs-`, `bundle-`).
///
/// # Construction
/// - [`CanonicalId::parse`] validates an externally supplied identifier.
/// - [`IdGenerator::next_id`] allocates a fresh one.
///
/// # Display format
/// When displayed or converted to string, `CanonicalId` always produces the
/// canonical 32-character lowercase hex format without hyphens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalId(Uuid);

impl CanonicalId {
    /// Validates and parses an identifier string that must already be in
    /// canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example,
    /// hyphenated or uppercase). Callers must provide the canonical
    /// representation.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(UuidError::InvalidInput(format!(
            "identifier must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns the identifier as a `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical identifier form.
    ///
    /// This is a purely syntactic check: exactly 32 bytes, lowercase hex only.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display in canonical (simple) form
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for CanonicalId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalId::parse(s)
    }
}

/// Source of fresh canonical identifiers.
///
/// Document assembly asks this capability for every generated id instead of
/// calling `Uuid::new_v4` directly. Production code uses [`UuidIds`]; tests
/// use [`SequenceIds`] to obtain a reproducible id stream.
pub trait IdGenerator: Send + Sync {
    /// Allocate a fresh canonical identifier.
    fn next_id(&self) -> CanonicalId;
}

/// Production identifier source backed by RFC 4122 version-4 UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> CanonicalId {
        CanonicalId(Uuid::new_v4())
    }
}

/// Deterministic identifier source for tests.
///
/// Yields `00000000000000000000000000000001`, `...0002` and so on, starting
/// from the seed passed to [`SequenceIds::starting_at`].
#[derive(Debug, Default)]
pub struct SequenceIds {
    counter: AtomicU64,
}

impl SequenceIds {
    /// A sequence beginning at 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// A sequence whose first id encodes `seed`.
    pub fn starting_at(seed: u64) -> Self {
        Self {
            counter: AtomicU64::new(seed),
        }
    }
}

impl IdGenerator for SequenceIds {
    fn next_id(&self) -> CanonicalId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let hex = format!("{:032x}", n);
        CanonicalId::parse(&hex).expect("formatted hex is canonical")
    }
}

/// Source of the current time.
///
/// The validator compares dates against "now" at invocation time and the
/// transformer stamps the bundle with its creation instant; both read this
/// capability so tests can pin the clock.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock reading the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant, for tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
