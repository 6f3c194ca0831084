//! A dual-mode 64-bit id counter.
//!
//! Every id has the layout
//! `42-bit timestamp | 10-bit machine id | 12-bit sequence`, but the two
//! modes advance it differently:
//!
//! - [`Mode::Fast`] bumps one packed counter with a single atomic add. Ids
//!   are unique and increasing per generator but only the seed carries a
//!   meaningful timestamp.
//! - [`Mode::Timestamp`] re-bases on the current millisecond and appends a
//!   wrapping sequence. Unlike [`crate::Node`] it never waits: more than
//!   4096 ids in one millisecond wrap the sequence and may collide.
//!
//! ```
//! use xid::wuid::{Mode, Wuid};
//!
//! let uid = Wuid::from_name("test");
//! let a = uid.next(Mode::Fast);
//! let b = uid.next(Mode::Fast);
//! assert_eq!(b.as_u64(), a.as_u64() + 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};

/// 2023-01-01T00:00:00Z in milliseconds.
pub const EPOCH: i64 = 1672531200000;
pub const MACHINE_ID_BITS: u8 = 10;
pub const SEQUENCE_BITS: u8 = 12;
pub const MAX_MACHINE_ID: u64 = (1 << MACHINE_ID_BITS) - 1;
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;
const SHIFT: u8 = MACHINE_ID_BITS + SEQUENCE_BITS;
const TIMESTAMP_MASK: u64 = (1 << (64 - SHIFT)) - 1;

/// How [`Wuid::next`] advances the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Fast,
    Timestamp,
}

/// An id produced by [`Wuid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(u64);

impl Uid {
    /// Raw packed value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Same bits reinterpreted as signed.
    pub const fn as_i64(self) -> i64 {
        self.0 as i64
    }

    /// Milliseconds since [`EPOCH`], as stored in the id.
    pub const fn timestamp(self) -> u64 {
        self.0 >> SHIFT
    }

    pub const fn machine_id(self) -> u64 {
        (self.0 >> SEQUENCE_BITS) & MAX_MACHINE_ID
    }

    /// Low 12 bits: the counter in fast mode, the wrapping sequence in
    /// timestamp mode.
    pub const fn sequence(self) -> u64 {
        self.0 & MAX_SEQUENCE
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Dual-mode generator bound to one machine id.
#[derive(Debug)]
pub struct Wuid<C: Clock = SystemClock> {
    machine_id: u64,
    clock: C,
    /// Fast-mode counter.
    counter: AtomicU64,
    /// Timestamp-mode base: current bucket and machine id, sequence bits clear.
    base: AtomicU64,
    /// Timestamp-mode sequence; only its low bits are used.
    sequence: AtomicU64,
}

impl Wuid {
    /// Create a generator on the system clock.
    ///
    /// # Arguments
    /// * `machine_id` - Machine identifier (0..=1023).
    ///
    /// # Returns
    /// A generator seeded with the current millisecond, or
    /// [`Error::MachineOutOfRange`].
    ///
    /// # Example
    /// ```
    /// use xid::wuid::Wuid;
    ///
    /// let uid = Wuid::new(7).unwrap();
    /// assert_eq!(uid.machine_id(), 7);
    /// assert!(Wuid::new(1024).is_err());
    /// ```
    pub fn new(machine_id: u64) -> Result<Self> {
        Self::with_clock(machine_id, SystemClock)
    }

    /// Machine id drawn from the thread-local random generator.
    pub fn random() -> Self {
        Self::build(rand::random::<u16>() as u64 & MAX_MACHINE_ID, SystemClock)
    }

    /// Machine id derived from a hash of `name`.
    ///
    /// Stable within one build of the standard library, not across them.
    pub fn from_name(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::build(hasher.finish() & MAX_MACHINE_ID, SystemClock)
    }
}

impl<C: Clock> Wuid<C> {
    /// Like [`Wuid::new`], reading time from `clock`.
    pub fn with_clock(machine_id: u64, clock: C) -> Result<Self> {
        if machine_id > MAX_MACHINE_ID {
            return Err(Error::MachineOutOfRange {
                machine: machine_id,
                max: MAX_MACHINE_ID,
            });
        }
        Ok(Self::build(machine_id, clock))
    }

    fn build(machine_id: u64, clock: C) -> Self {
        let seed = compose(elapsed(&clock), machine_id);
        debug!(machine_id, seed, "wuid generator created");
        Self {
            machine_id,
            clock,
            counter: AtomicU64::new(seed),
            base: AtomicU64::new(seed),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn machine_id(&self) -> u64 {
        self.machine_id
    }

    /// Generate the next id in `mode`.
    ///
    /// # Arguments
    /// * `mode` - [`Mode::Fast`] for one atomic add, [`Mode::Timestamp`] to
    ///   stamp the current millisecond.
    ///
    /// # Example
    /// ```
    /// use xid::wuid::{Mode, Wuid};
    ///
    /// let uid = Wuid::new(3).unwrap();
    /// let id = uid.next(Mode::Timestamp);
    /// assert_eq!(id.machine_id(), 3);
    /// assert_eq!(id.sequence(), 1);
    /// ```
    pub fn next(&self, mode: Mode) -> Uid {
        match mode {
            Mode::Fast => self.next_fast(),
            Mode::Timestamp => self.next_with_timestamp(),
        }
    }

    /// Increment the packed counter.
    pub fn next_fast(&self) -> Uid {
        Uid(self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1))
    }

    /// Current millisecond bucket plus a wrapping sequence.
    pub fn next_with_timestamp(&self) -> Uid {
        let now = elapsed(&self.clock);
        let mut base = self.base.load(Ordering::Acquire);
        if now > base >> SHIFT {
            let fresh = compose(now, self.machine_id);
            // losing means another caller already moved the base forward
            base = match self.base.compare_exchange(base, fresh, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => fresh,
                Err(current) => current,
            };
        }
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1) & MAX_SEQUENCE;
        if seq == 0 {
            trace!(machine_id = self.machine_id, "timestamp sequence wrapped");
        }
        Uid((base & !MAX_SEQUENCE) | seq)
    }

    /// Next fast-mode id as `i64`.
    ///
    /// # Example
    /// ```
    /// use xid::wuid::Wuid;
    ///
    /// let uid = Wuid::new(1).unwrap();
    /// let a = uid.next_i64();
    /// assert_eq!(uid.next_i64(), a + 1);
    /// ```
    pub fn next_i64(&self) -> i64 {
        self.next_fast().as_i64()
    }

    /// Next fast-mode id in decimal.
    pub fn next_string(&self) -> String {
        self.next_fast().to_string()
    }
}

/// Milliseconds since [`EPOCH`], truncated to the timestamp field.
fn elapsed<C: Clock>(clock: &C) -> u64 {
    (clock.now_millis().saturating_sub(EPOCH) as u64) & TIMESTAMP_MASK
}

fn compose(timestamp: u64, machine_id: u64) -> u64 {
    (timestamp << SHIFT) | (machine_id << SEQUENCE_BITS)
}

static GENERATOR: OnceLock<Wuid> = OnceLock::new();

/// Process-wide generator with a random machine id.
fn wgen() -> &'static Wuid {
    GENERATOR.get_or_init(Wuid::random)
}

/// Next id from the process-wide generator.
pub fn new(mode: Mode) -> Uid {
    wgen().next(mode)
}

/// Next fast-mode id as `i64`.
pub fn generate_id_i64() -> i64 {
    wgen().next_i64()
}

/// Next fast-mode id as a decimal string.
pub fn generate_id_string() -> String {
    wgen().next_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::clock::ManualClock;

    fn manual(machine_id: u64, at: i64) -> (Arc<ManualClock>, Wuid<Arc<ManualClock>>) {
        let clock = Arc::new(ManualClock::new(EPOCH + at));
        let uid = Wuid::with_clock(machine_id, clock.clone()).unwrap();
        (clock, uid)
    }

    #[test]
    fn test_machine_range() {
        assert!(Wuid::new(MAX_MACHINE_ID).is_ok());
        assert_eq!(
            Wuid::new(1024).unwrap_err(),
            Error::MachineOutOfRange {
                machine: 1024,
                max: 1023
            }
        );
        assert!(Wuid::random().machine_id() <= MAX_MACHINE_ID);
    }

    #[test]
    fn test_from_name_is_stable() {
        assert_eq!(
            Wuid::from_name("test").machine_id(),
            Wuid::from_name("test").machine_id()
        );
    }

    #[test]
    fn test_fast_mode_increments_seed() {
        let (_clock, uid) = manual(3, 250);
        let seed = (250u64 << 22) | (3 << 12);
        assert_eq!(uid.next_fast().as_u64(), seed + 1);
        assert_eq!(uid.next(Mode::Fast).as_u64(), seed + 2);
        assert_eq!(uid.next_i64(), (seed + 3) as i64);
        assert_eq!(uid.next_string(), (seed + 4).to_string());
    }

    #[test]
    fn test_timestamp_mode_layout() {
        let (clock, uid) = manual(9, 1_000);
        let a = uid.next_with_timestamp();
        assert_eq!(a.timestamp(), 1_000);
        assert_eq!(a.machine_id(), 9);
        assert_eq!(a.sequence(), 1);

        let b = uid.next(Mode::Timestamp);
        assert_eq!(b.timestamp(), 1_000);
        assert_eq!(b.sequence(), 2);

        clock.advance(5);
        let c = uid.next_with_timestamp();
        assert_eq!(c.timestamp(), 1_005);
        assert_eq!(c.machine_id(), 9);
        // the sequence keeps counting across buckets
        assert_eq!(c.sequence(), 3);
        assert!(c > b);
    }

    #[test]
    fn test_timestamp_sequence_wraps() {
        let (_clock, uid) = manual(1, 10);
        let first = uid.next_with_timestamp();
        for _ in 0..MAX_SEQUENCE {
            uid.next_with_timestamp();
        }
        // 4096 ids into the same millisecond: sequence wrapped to where it started
        let wrapped = uid.next_with_timestamp();
        assert_eq!(wrapped.sequence(), first.sequence());
        assert_eq!(wrapped, first);
    }

    #[test]
    fn test_timestamp_mode_ignores_backward_clock() {
        let (clock, uid) = manual(2, 500);
        let a = uid.next_with_timestamp();
        clock.set(EPOCH + 100);
        let b = uid.next_with_timestamp();
        assert_eq!(b.timestamp(), 500);
        assert!(b > a);
    }

    #[test]
    fn test_extreme_clock_does_not_overflow() {
        let clock = ManualClock::new(i64::MIN);
        let uid = Wuid::with_clock(1, &clock).unwrap();
        assert_eq!(uid.next_with_timestamp().machine_id(), 1);
        clock.set(i64::MAX);
        assert_eq!(uid.next_with_timestamp().machine_id(), 1);
    }

    #[test]
    fn test_modes_share_machine_id() {
        let uid = Wuid::new(77).unwrap();
        assert_eq!(uid.next(Mode::Fast).machine_id(), 77);
        assert_eq!(uid.next(Mode::Timestamp).machine_id(), 77);
    }

    #[test]
    fn test_fast_mode_concurrent_uniqueness() {
        let uid = Wuid::new(4).unwrap();
        let unique: HashSet<Uid> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| (0..10_000).map(|_| uid.next_fast()).collect::<Vec<_>>()))
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(unique.len(), 80_000);
    }

    #[test]
    fn test_timestamp_mode_concurrent_within_capacity() {
        // fewer than 4096 ids per bucket cannot collide
        let (_clock, uid) = manual(6, 42);
        let unique: HashSet<Uid> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..1_000).map(|_| uid.next_with_timestamp()).collect::<Vec<_>>()))
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(unique.len(), 4_000);
    }

    #[test]
    fn test_global_helpers() {
        let a = generate_id_i64();
        let b: i64 = generate_id_string().parse().unwrap();
        assert!(b > a);
        let c = new(Mode::Timestamp);
        assert_eq!(c.machine_id(), wgen().machine_id());
    }
}
