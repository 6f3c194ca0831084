//! # xid
//!
//! Lock-free, time-sortable 64-bit unique ids for systems where no central
//! coordinator hands out ids.
//!
//! ## Features
//! - **Snowflake layout**: `41-bit timestamp | 10-bit node | 12-bit step`,
//!   with configurable widths and epoch.
//! - **Lock-free**: generation is a compare-and-swap loop on one atomic
//!   word; independent [`Node`]s share nothing.
//! - **Dual-mode counter**: [`wuid::Wuid`] trades wall-clock accuracy for a
//!   single atomic add per id.
//! - **Encodings**: decimal, base2, base32, base36, base58, base64 and
//!   8-byte big-endian.
//! - **JSON**: ids travel as quoted decimal strings (with `serde` support
//!   behind the default `serde` feature).
//!
//! ## Quick Start
//!
//! ```rust
//! use xid::Node;
//!
//! let node = Node::new(1).unwrap();
//! let id = node.next();
//! println!("{} {} {}", id, id.base58(), id.base32());
//! assert_eq!(id.node(), 1);
//! ```
//!
//! Or use the process-wide generator (node 1):
//!
//! ```rust
//! let a = xid::new();
//! let b = xid::new();
//! assert!(b > a);
//! ```
//!
//! ## Configuration
//!
//! Widths and epoch are fixed per generator at construction. Set the
//! process-wide defaults at startup, before creating generators:
//!
//! ```rust
//! use xid::{Node, XidOption};
//!
//! // 2024-01-01 00:00:00 UTC
//! XidOption::epoch(1704067200000);
//! XidOption::node_bits(8);
//! let node = Node::new(255).unwrap();
//! assert_eq!(node.layout().time_shift, 20);
//! XidOption::reset();
//! ```
//!
//! ## Liveness
//!
//! [`Node::next`] never fails. If more than `2^step_bits` ids are requested
//! within one millisecond, or the clock reads earlier than the last id, it
//! spins until time moves on. A clock that never recovers keeps it spinning;
//! callers that cannot tolerate that must bound the call themselves.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};

use tracing::debug;

pub mod clock;
pub mod encode;
mod error;
mod id;
mod json;
pub mod layout;
mod node;
pub mod wuid;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use error::{Error, Result};
pub use id::Id;
pub use json::MAX_JSON_SIZE;
pub use layout::{Layout, Settings};
pub use node::{Node, Parts};

use layout::{DEFAULT_EPOCH, DEFAULT_NODE_BITS, DEFAULT_STEP_BITS};

/// Process-wide settings picked up by [`Node::new`].
static EPOCH: AtomicI64 = AtomicI64::new(DEFAULT_EPOCH);
static NODE_BITS: AtomicU8 = AtomicU8::new(DEFAULT_NODE_BITS);
static STEP_BITS: AtomicU8 = AtomicU8::new(DEFAULT_STEP_BITS);

/// Startup configuration for generators created with [`Node::new`].
///
/// Changes only affect generators constructed afterwards. Every generator
/// whose ids are compared with each other must use the same values.
pub struct XidOption;

impl XidOption {
    /// Set the epoch, in milliseconds since the Unix epoch.
    pub fn epoch(ms: i64) {
        EPOCH.store(ms, Ordering::Relaxed);
        debug!(epoch = ms, "xid epoch changed");
    }

    /// Set the width of the node field.
    ///
    /// # Arguments
    /// * `bits` - Node bits; together with the step bits at most 62.
    ///   Invalid widths surface as an error from [`Node::new`].
    ///
    /// # Example
    /// ```
    /// use xid::{Node, XidOption};
    ///
    /// XidOption::node_bits(4);
    /// assert!(Node::new(15).is_ok());
    /// assert!(Node::new(16).is_err());
    /// XidOption::reset();
    /// ```
    pub fn node_bits(bits: u8) {
        NODE_BITS.store(bits, Ordering::Relaxed);
        debug!(node_bits = bits, "xid node bits changed");
    }

    /// Set the width of the per-millisecond step field.
    ///
    /// # Arguments
    /// * `bits` - Step bits; `2^bits` ids fit in one millisecond per node.
    pub fn step_bits(bits: u8) {
        STEP_BITS.store(bits, Ordering::Relaxed);
        debug!(step_bits = bits, "xid step bits changed");
    }

    /// Apply a whole [`Settings`], e.g. one loaded from a config file.
    pub fn apply(settings: Settings) {
        Self::epoch(settings.epoch);
        Self::node_bits(settings.node_bits);
        Self::step_bits(settings.step_bits);
    }

    /// Snapshot of the current process-wide settings.
    ///
    /// # Returns
    /// The [`Settings`] the next [`Node::new`] will use.
    ///
    /// # Example
    /// ```
    /// use xid::{Settings, XidOption};
    /// assert_eq!(XidOption::settings(), Settings::default());
    /// ```
    pub fn settings() -> Settings {
        Settings {
            epoch: EPOCH.load(Ordering::Relaxed),
            node_bits: NODE_BITS.load(Ordering::Relaxed),
            step_bits: STEP_BITS.load(Ordering::Relaxed),
        }
    }

    /// Restore epoch `1288834974657`, 10 node bits and 12 step bits.
    pub fn reset() {
        Self::apply(Settings::default());
    }
}

/// Global generator instance, initialized on first use.
static GENERATOR: OnceLock<Node> = OnceLock::new();

/// Get the global [`Node`], creating it with node 1 and the current
/// [`XidOption`] settings. Falls back to the default settings if those are
/// invalid.
fn xgen() -> &'static Node {
    GENERATOR.get_or_init(|| {
        Node::new(1).unwrap_or_else(|err| {
            tracing::warn!(%err, "invalid xid options, using defaults");
            Node::with_settings(1, Settings::default()).expect("node 1 fits the default layout")
        })
    })
}

/// Next id from the process-wide generator.
pub fn new() -> Id {
    xgen().next()
}
