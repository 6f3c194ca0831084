//! The snowflake generator core.

use std::hint::spin_loop;
use std::sync::atomic::{AtomicI64, Ordering};

use tracing::{debug, trace, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::error::{Error, Result};
use crate::id::Id;
use crate::layout::{self, Layout, Settings};

/// State word before the first id: decodes as timestamp `-1` with the
/// step field exhausted, so the first reading at or after the epoch wins.
const UNSET: i64 = -1;

/// An id split into its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parts {
    /// Unix milliseconds.
    pub time: i64,
    pub node: i64,
    pub step: i64,
}

/// A lock-free snowflake generator for one node identity.
///
/// Ids from one `Node` are unique and strictly increasing as long as its
/// clock does not go backward. Share it between threads by reference or
/// behind an `Arc`; all state lives in a single atomic word.
///
/// ```
/// let node = xid::Node::new(1).unwrap();
/// let a = node.next();
/// let b = node.next();
/// assert!(b > a);
/// assert_eq!(b.node(), 1);
/// ```
#[derive(Debug)]
pub struct Node<C: Clock = MonotonicClock> {
    node: i64,
    layout: Layout,
    clock: C,
    /// `(last timestamp << step_bits) | last issued step`
    state: AtomicI64,
}

impl Node {
    /// Create a generator with the process-wide settings from
    /// [`crate::XidOption`].
    pub fn new(node: i64) -> Result<Self> {
        Self::with_settings(node, crate::XidOption::settings())
    }

    pub fn with_settings(node: i64, settings: Settings) -> Result<Self> {
        Node::with_clock(node, settings, MonotonicClock::new())
    }
}

impl<C: Clock> Node<C> {
    /// Create a generator reading time from `clock`.
    ///
    /// Fails if `node` does not fit the node field, or if the current time
    /// already overflows the timestamp field left by the widths. Publishes
    /// the derived layout for [`Id::time`], [`Id::node`] and [`Id::step`].
    pub fn with_clock(node: i64, settings: Settings, clock: C) -> Result<Self> {
        let layout = Layout::new(settings)?;
        if node < 0 || node > layout.node_max {
            return Err(Error::NodeOutOfRange {
                node,
                max: layout.node_max,
            });
        }
        let elapsed = clock.now_millis().saturating_sub(layout.epoch);
        if elapsed > layout.max_elapsed() {
            return Err(Error::TimestampOverflow {
                elapsed,
                time_bits: 63 - layout.time_shift,
            });
        }
        layout::publish(layout);
        debug!(
            node,
            epoch = settings.epoch,
            node_bits = settings.node_bits,
            step_bits = settings.step_bits,
            "snowflake node created"
        );
        Ok(Self {
            node,
            layout,
            clock,
            state: AtomicI64::new(UNSET),
        })
    }

    /// Node identity this generator stamps into every id.
    pub fn id(&self) -> i64 {
        self.node
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Milliseconds since this generator's epoch.
    fn elapsed(&self) -> i64 {
        self.clock.now_millis().saturating_sub(self.layout.epoch)
    }

    /// Generate the next id.
    ///
    /// Never fails. When the step field is exhausted within a millisecond,
    /// or the clock reads earlier than the last id, this spins until the
    /// clock moves past the last timestamp.
    pub fn next(&self) -> Id {
        let step_bits = self.layout.node_shift;
        let step_mask = self.layout.step_mask;
        let mut exhausted = false;
        let mut warned = false;

        loop {
            let now = self.elapsed();
            let old = self.state.load(Ordering::Acquire);
            let last = old >> step_bits;

            if now > last {
                let fresh = now << step_bits;
                if self
                    .state
                    .compare_exchange_weak(old, fresh, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return Id(self.layout.compose(now, self.node, 0));
                }
            } else if now == last {
                let step = (old & step_mask) + 1;
                if step > step_mask {
                    if !exhausted {
                        trace!(node = self.node, now, "step exhausted, waiting for next millisecond");
                        exhausted = true;
                    }
                    spin_loop();
                    continue;
                }
                if self
                    .state
                    .compare_exchange_weak(old, old + 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return Id(self.layout.compose(now, self.node, step));
                }
            } else {
                if !warned {
                    warn!(
                        node = self.node,
                        now,
                        last,
                        "clock moved backwards, waiting for it to catch up"
                    );
                    warned = true;
                }
                spin_loop();
            }
        }
    }

    /// Split `id` using this generator's layout.
    pub fn decompose(&self, id: Id) -> Parts {
        Parts {
            time: self.layout.time(id.0),
            node: self.layout.node(id.0),
            step: self.layout.step(id.0),
        }
    }
}
