//! Bit layout of a packed id.
//!
//! ```text
//! | sign | timestamp (ms since epoch) | node | step |
//!   1 bit   63 - node_bits - step_bits   10     12    (defaults)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::error::{Error, Result};

/// Twitter's epoch, 2010-11-04T01:42:54.657Z, in milliseconds.
pub const DEFAULT_EPOCH: i64 = 1288834974657;
pub const DEFAULT_NODE_BITS: u8 = 10;
pub const DEFAULT_STEP_BITS: u8 = 12;

/// Upper bound on `node_bits + step_bits`; the sign bit and at least one
/// timestamp bit stay free.
const MAX_FIELD_BITS: u8 = 62;

/// Epochs must fit a signed 48-bit field of the active layout word,
/// roughly +/- 4400 years around 1970.
const EPOCH_LIMIT: i64 = 1 << 47;

/// Startup configuration of the generator core.
///
/// All generators whose ids must be comparable need the same settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    /// Epoch in milliseconds since the Unix epoch.
    pub epoch: i64,
    pub node_bits: u8,
    pub step_bits: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
            node_bits: DEFAULT_NODE_BITS,
            step_bits: DEFAULT_STEP_BITS,
        }
    }
}

/// Shifts and masks derived from a [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub epoch: i64,
    pub node_max: i64,
    pub node_mask: i64,
    pub step_mask: i64,
    pub time_shift: u8,
    pub node_shift: u8,
}

impl Layout {
    pub const fn default_layout() -> Self {
        Self::derive(DEFAULT_EPOCH, DEFAULT_NODE_BITS, DEFAULT_STEP_BITS)
    }

    /// Derive the layout, rejecting widths that leave no timestamp bits
    /// and epochs outside +/- 2^47 milliseconds.
    ///
    /// ```
    /// use xid::{Layout, Settings};
    ///
    /// let layout = Layout::new(Settings::default()).unwrap();
    /// assert_eq!(layout.time_shift, 22);
    /// assert!(Layout::new(Settings { node_bits: 40, step_bits: 30, ..Settings::default() }).is_err());
    /// ```
    pub fn new(settings: Settings) -> Result<Self> {
        let Settings {
            epoch,
            node_bits,
            step_bits,
        } = settings;
        if node_bits as u16 + step_bits as u16 > MAX_FIELD_BITS as u16 {
            return Err(Error::InvalidLayout {
                node_bits,
                step_bits,
            });
        }
        if !(-EPOCH_LIMIT..EPOCH_LIMIT).contains(&epoch) {
            return Err(Error::EpochOutOfRange { epoch });
        }
        Ok(Self::derive(epoch, node_bits, step_bits))
    }

    const fn derive(epoch: i64, node_bits: u8, step_bits: u8) -> Self {
        let node_max = !(-1i64 << node_bits);
        Self {
            epoch,
            node_max,
            node_mask: node_max << step_bits,
            step_mask: !(-1i64 << step_bits),
            time_shift: node_bits + step_bits,
            node_shift: step_bits,
        }
    }

    pub const fn node_bits(&self) -> u8 {
        self.time_shift - self.node_shift
    }

    pub const fn step_bits(&self) -> u8 {
        self.node_shift
    }

    /// Largest elapsed millisecond count the timestamp field can hold
    /// without reaching the sign bit.
    pub const fn max_elapsed(&self) -> i64 {
        i64::MAX >> self.time_shift
    }

    /// Compose a packed id from its fields. `elapsed` is measured from
    /// the epoch, not from the Unix epoch.
    #[inline]
    pub fn compose(&self, elapsed: i64, node: i64, step: i64) -> i64 {
        (elapsed << self.time_shift) | (node << self.node_shift) | step
    }

    /// Absolute Unix milliseconds encoded in `id`.
    #[inline]
    pub fn time(&self, id: i64) -> i64 {
        (id >> self.time_shift) + self.epoch
    }

    #[inline]
    pub fn node(&self, id: i64) -> i64 {
        (id & self.node_mask) >> self.node_shift
    }

    #[inline]
    pub fn step(&self, id: i64) -> i64 {
        id & self.step_mask
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::default_layout()
    }
}

/// `epoch << 16 | node_bits << 8 | step_bits`
const fn pack(layout: &Layout) -> u64 {
    ((layout.epoch as u64) << 16) | ((layout.node_bits() as u64) << 8) | layout.step_bits() as u64
}

const fn unpack(word: u64) -> Layout {
    // arithmetic shift restores the epoch's sign
    Layout::derive((word as i64) >> 16, (word >> 8) as u8, word as u8)
}

/// Layout used by the field accessors on [`crate::Id`], as one packed word
/// so readers never see half of an update.
///
/// Written only when a generator is constructed; read by `Id::time`,
/// `Id::node` and `Id::step`.
static ACTIVE: AtomicU64 = AtomicU64::new(pack(&Layout::default_layout()));

/// Make `layout` the process-wide layout for id field extraction.
pub(crate) fn publish(layout: Layout) {
    ACTIVE.store(pack(&layout), Ordering::Release);
}

/// The layout of the most recently constructed generator.
pub fn active() -> Layout {
    unpack(ACTIVE.load(Ordering::Acquire))
}
