//! Lockless transposition table using atomic XOR-based torn-write detection.
//!
//! Four entries per 64-byte bucket, two `AtomicU64` words per entry.
//!
//! ## Bit layout
//!
//! ```text
//! word0 (AtomicU64):
//!   bits 63-32: key           (upper 32 bits of Zobrist hash)
//!   bits 31-26: generation    (6 bits, wraps at 64)
//!   bits 25-24: bound         (2 bits)
//!   bits 23-16: depth         (i8)
//!   bits 15-0:  move          (16 bits)
//!
//! word1 (AtomicU64):
//!   bits 63-32: check         = key XOR (word0 & 0xFFFF_FFFF)
//!   bits 31-16: value         (i16)
//!   bits 15-0:  eval          (i16)
//! ```
//!
//! ## Torn-write detection
//!
//! On probe: `check_expected = (w0 >> 32) ^ (w0 & 0xFFFF_FFFF)`.
//! If `check_expected != (w1 >> 32)` another thread wrote the entry between
//! our two loads and the probe misses. Moves read from the table are still
//! validated against the position before they are played.
//!
//! All atomic accesses use `Relaxed` ordering.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use vesper_core::Move;

use crate::search::{TBWIN_IN_MAX, VALUE_NONE};

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<TranspositionTable>();
    }
    let _ = check;
};

const BUCKET_SIZE: usize = 4;
/// Generations are six bits and wrap every 64 searches. An entry left
/// untouched for exactly 64 searches reads as current again; ages used for
/// replacement are taken modulo 64.
const GENERATION_MASK: u8 = 0x3F;

/// Bound type stored in a TT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// Static evaluation only, no search result.
    None = 0,
    /// The stored value is a lower bound (failed high).
    Lower = 1,
    /// The stored value is an upper bound (failed low).
    Upper = 2,
    Exact = 3,
}

impl Bound {
    const fn from_bits(bits: u8) -> Bound {
        match bits & 0x03 {
            1 => Bound::Lower,
            2 => Bound::Upper,
            3 => Bound::Exact,
            _ => Bound::None,
        }
    }

    /// Exact bounds count as both lower and upper.
    #[inline]
    pub const fn is_lower(self) -> bool {
        self as u8 & Bound::Lower as u8 != 0
    }

    #[inline]
    pub const fn is_upper(self) -> bool {
        self as u8 & Bound::Upper as u8 != 0
    }

    /// True if a value with this bound settles the window on its own.
    #[inline]
    pub fn cuts(self, value: i32, alpha: i32, beta: i32) -> bool {
        match self {
            Bound::Exact => true,
            Bound::Lower => value >= beta,
            Bound::Upper => value <= alpha,
            Bound::None => false,
        }
    }
}

/// A successful probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub mv: Move,
    /// Search value, already adjusted to be relative to the probing node.
    pub value: i32,
    /// Static evaluation, or [`VALUE_NONE`].
    pub eval: i32,
    pub depth: i32,
    pub bound: Bound,
}

/// Convert a search value to table form.
///
/// Mate and tablebase scores count plies from the root; in the table they
/// count from the stored node so that transpositions at other heights can
/// reuse them.
pub fn value_to_tt(value: i32, height: usize) -> i32 {
    let height = height as i32;
    if value == VALUE_NONE {
        VALUE_NONE
    } else if value >= TBWIN_IN_MAX {
        value + height
    } else if value <= -TBWIN_IN_MAX {
        value - height
    } else {
        value
    }
}

/// Reverses [`value_to_tt`].
pub fn value_from_tt(value: i32, height: usize) -> i32 {
    let height = height as i32;
    if value == VALUE_NONE {
        VALUE_NONE
    } else if value >= TBWIN_IN_MAX {
        value - height
    } else if value <= -TBWIN_IN_MAX {
        value + height
    } else {
        value
    }
}

struct AtomicEntry {
    word0: AtomicU64,
    word1: AtomicU64,
}

impl AtomicEntry {
    const fn new() -> Self {
        Self { word0: AtomicU64::new(0), word1: AtomicU64::new(0) }
    }

    fn pack_word0(key32: u32, generation: u8, bound: Bound, depth: i32, mv: Move) -> u64 {
        let depth = depth.clamp(i8::MIN as i32, i8::MAX as i32) as i8 as u8;
        (key32 as u64) << 32
            | ((generation & GENERATION_MASK) as u64) << 26
            | (bound as u64) << 24
            | (depth as u64) << 16
            | mv.raw() as u64
    }

    fn pack_word1(w0: u64, value: i32, eval: i32) -> u64 {
        let check = ((w0 >> 32) as u32 ^ w0 as u32) as u64;
        check << 32 | ((value as i16 as u16) as u64) << 16 | (eval as i16 as u16) as u64
    }

    fn key32(w0: u64) -> u32 {
        (w0 >> 32) as u32
    }

    fn generation(w0: u64) -> u8 {
        ((w0 >> 26) as u8) & GENERATION_MASK
    }

    fn bound(w0: u64) -> Bound {
        Bound::from_bits((w0 >> 24) as u8)
    }

    fn depth(w0: u64) -> i32 {
        (w0 >> 16) as u8 as i8 as i32
    }

    /// Both words, or `None` if the XOR check detects a torn write.
    fn load(&self) -> Option<(u64, u64)> {
        let w0 = self.word0.load(Ordering::Relaxed);
        let w1 = self.word1.load(Ordering::Relaxed);
        let expected = (w0 >> 32) as u32 ^ w0 as u32;
        if expected != (w1 >> 32) as u32 {
            return None;
        }
        Some((w0, w1))
    }

    fn store(&self, w0: u64, w1: u64) {
        self.word0.store(w0, Ordering::Relaxed);
        self.word1.store(w1, Ordering::Relaxed);
    }

    fn peek_w0(&self) -> u64 {
        self.word0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.store(0, 0);
    }
}

#[repr(align(64))]
struct Bucket {
    entries: [AtomicEntry; BUCKET_SIZE],
}

impl Bucket {
    const fn new() -> Self {
        Self {
            entries: [AtomicEntry::new(), AtomicEntry::new(), AtomicEntry::new(), AtomicEntry::new()],
        }
    }
}

/// Shared, lock-free cache of search results keyed by position hash.
///
/// All methods take `&self`; concurrent writers may overwrite each other.
pub struct TranspositionTable {
    buckets: Box<[Bucket]>,
    mask: u64,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Allocate a table of roughly `mb` megabytes, rounded down to a power
    /// of two buckets.
    pub fn new(mb: usize) -> Self {
        let bytes = mb.max(1) * 1024 * 1024;
        let count = bytes / std::mem::size_of::<Bucket>();
        let count = if count.is_power_of_two() { count } else { count.next_power_of_two() >> 1 };
        let count = count.max(1);
        let buckets: Box<[Bucket]> = (0..count).map(|_| Bucket::new()).collect();
        tracing::debug!(mb, buckets = count, "allocated transposition table");
        Self { buckets, mask: (count - 1) as u64, generation: AtomicU8::new(0) }
    }

    /// Clear all entries and reset the generation counter.
    pub fn clear(&self) {
        for bucket in self.buckets.iter() {
            for entry in &bucket.entries {
                entry.reset();
            }
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Start a new search. Entries written by earlier searches stop matching.
    pub fn new_generation(&self) {
        let next = (self.generation.load(Ordering::Relaxed) + 1) & GENERATION_MASK;
        self.generation.store(next, Ordering::Relaxed);
    }

    fn current_generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    fn bucket(&self, hash: u64) -> &Bucket {
        &self.buckets[(hash & self.mask) as usize]
    }

    /// Look up `hash` as seen from a node `height` plies below the root.
    ///
    /// Misses on key mismatch, torn writes and entries from older searches.
    pub fn probe(&self, hash: u64, height: usize) -> Option<TtEntry> {
        let key32 = (hash >> 32) as u32;
        let generation = self.current_generation();
        self.bucket(hash).entries.iter().find_map(|entry| {
            let (w0, w1) = entry.load()?;
            if AtomicEntry::key32(w0) != key32 || w0 == 0 || AtomicEntry::generation(w0) != generation {
                return None;
            }
            Some(TtEntry {
                mv: Move::from_raw(w0 as u16),
                value: value_from_tt((w1 >> 16) as u16 as i16 as i32, height),
                eval: w1 as u16 as i16 as i32,
                depth: AtomicEntry::depth(w0),
                bound: AtomicEntry::bound(w0),
            })
        })
    }

    /// Store a result.
    ///
    /// Reuses the slot already holding `hash` if there is one, otherwise
    /// replaces the slot with the lowest depth after a penalty for age. A
    /// same-position entry survives a much shallower non-exact write.
    #[allow(clippy::too_many_arguments)]
    pub fn store(&self, hash: u64, height: usize, mv: Move, value: i32, eval: i32, depth: i32, bound: Bound) {
        let key32 = (hash >> 32) as u32;
        let generation = self.current_generation();
        let entries = &self.bucket(hash).entries;

        let age = |w0: u64| (64 + generation as i32 - AtomicEntry::generation(w0) as i32) & GENERATION_MASK as i32;
        let worth = |w0: u64| AtomicEntry::depth(w0) - 4 * age(w0);

        let mut replace = 0;
        let mut same_key = None;
        for (i, entry) in entries.iter().enumerate() {
            let w0 = entry.peek_w0();
            if w0 != 0 && AtomicEntry::key32(w0) == key32 {
                same_key = Some(i);
                break;
            }
            // Ties keep the earlier slot, so an empty bucket fills from the front.
            if worth(entries[replace].peek_w0()) > worth(w0) {
                replace = i;
            }
        }

        let slot = same_key.unwrap_or(replace);
        let existing = entries[slot].peek_w0();
        if same_key.is_some()
            && bound != Bound::Exact
            && AtomicEntry::generation(existing) == generation
            && depth < AtomicEntry::depth(existing) - 2
        {
            return;
        }

        let w0 = AtomicEntry::pack_word0(key32, generation, bound, depth, mv);
        let w1 = AtomicEntry::pack_word1(w0, value_to_tt(value, height), eval);
        entries[slot].store(w0, w1);
    }

    /// Per-mille of sampled entries written during the current search.
    pub fn hashfull(&self) -> usize {
        let generation = self.current_generation();
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.entries.iter())
            .take(1000)
            .filter(|entry| {
                let w0 = entry.peek_w0();
                w0 != 0 && AtomicEntry::generation(w0) == generation && AtomicEntry::bound(w0) != Bound::None
            })
            .count()
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("buckets", &self.buckets.len())
            .field("generation", &self.current_generation())
            .finish()
    }
}
