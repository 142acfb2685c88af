//! # linktrie
//!
//! A compact map from byte-string keys to values, stored as a character trie
//! in one growable array of fixed-size cells.
//!
//! Cells reference each other by array index instead of by pointer: a branch
//! cell carries the byte it matches plus a child link (next byte of the same
//! key) and a sibling link (alternative byte at the same depth). The byte `0`
//! is the terminator symbol; a key's implicit trailing `0` is matched like
//! any other symbol, and the cell matching it is the terminal that holds the
//! key's value. Because links are indices, the whole structure can be copied
//! into another trie verbatim with [`Trie::copy_from`].
//!
//! ## Example
//!
//! ```rust
//! use linktrie::Trie;
//!
//! let mut t: Trie<u64> = Trie::new();
//! t.insert(b"hello", 1).unwrap();
//! t.insert(b"world", 2).unwrap();
//!
//! assert_eq!(t.get(b"hello"), Some(&1));
//! assert_eq!(t.suggest(b"hel").unwrap(), b"hello");
//! ```

#![forbid(unsafe_code)]

use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

/// Node capacity used by `Trie::new`.
const DEFAULT_NODE_CAPACITY: usize = 16;

/// Initial capacity of the output buffer built by `suggest`.
const SUGGEST_BUF_CAPACITY: usize = 16;

/// Character seeded into the root cell. Any common starting character will do;
/// the root participates in matching like every other cell.
const ROOT_CHARACTER: u8 = b'a';

/// The terminator symbol. A cell matching it is a terminal cell.
const TERMINATOR: u8 = 0;

// =============================================================================
// Errors
// =============================================================================

/// Errors reported by trie operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TrieError {
    /// Growing the node array or an output buffer failed. The trie is left in
    /// its last fully consistent state; entries stored so far stay reachable.
    #[error("memory allocation failed while growing trie storage")]
    OutOfMemory,
    /// The empty key (or a key starting with the terminator byte `0`) cannot
    /// be stored.
    #[error("the empty key is not storable")]
    EmptyKey,
}

// =============================================================================
// Cell index
// =============================================================================

/// Index of a cell in the trie's node array.
///
/// Slot 0 permanently holds the root, which is never the target of a link, so
/// 0 doubles as the "no link" sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
struct NodeRef(u32);

impl NodeRef {
    const NONE: NodeRef = NodeRef(0);
    const ROOT: NodeRef = NodeRef(0);

    #[inline]
    fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        NodeRef(idx as u32)
    }

    #[inline]
    fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Cells
// =============================================================================

/// One cell of the trie: the byte it matches plus its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Node<V> {
    /// Byte this cell matches; `TERMINATOR` marks a terminal cell.
    character: u8,
    slot: Slot<V>,
}

/// Payload of a cell. The variant is fully determined by `character`: branch
/// cells never hold a value, terminal cells never hold a child link.
///
/// A terminal still carries a sibling link because it can sit inside an
/// alternatives chain: when one stored key is a strict prefix of another, the
/// terminator symbol competes with ordinary bytes at the same depth.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Slot<V> {
    Branch {
        child: NodeRef,
        sibling: NodeRef,
    },
    Terminal {
        /// `None` until an insert completes at this cell. A partial path left
        /// behind by a failed insert reads back as not-found.
        value: Option<V>,
        sibling: NodeRef,
    },
}

impl<V> Node<V> {
    /// Fresh cell with both links cleared to the sentinel.
    fn fresh(character: u8) -> Self {
        let slot = if character == TERMINATOR {
            Slot::Terminal {
                value: None,
                sibling: NodeRef::NONE,
            }
        } else {
            Slot::Branch {
                child: NodeRef::NONE,
                sibling: NodeRef::NONE,
            }
        };
        Node { character, slot }
    }

    #[inline]
    fn child(&self) -> NodeRef {
        match self.slot {
            Slot::Branch { child, .. } => child,
            Slot::Terminal { .. } => NodeRef::NONE,
        }
    }

    #[inline]
    fn sibling(&self) -> NodeRef {
        match self.slot {
            Slot::Branch { sibling, .. } => sibling,
            Slot::Terminal { sibling, .. } => sibling,
        }
    }

    #[inline]
    fn set_child(&mut self, link: NodeRef) {
        match &mut self.slot {
            Slot::Branch { child, .. } => *child = link,
            Slot::Terminal { .. } => unreachable!("terminal cell cannot grow a child link"),
        }
    }

    #[inline]
    fn set_sibling(&mut self, link: NodeRef) {
        match &mut self.slot {
            Slot::Branch { sibling, .. } => *sibling = link,
            Slot::Terminal { sibling, .. } => *sibling = link,
        }
    }
}

// =============================================================================
// Suggest output buffer
// =============================================================================

/// Growable byte buffer with the same doubling policy and fallible growth as
/// the cell array.
struct ByteBuf {
    bytes: Vec<u8>,
}

impl ByteBuf {
    fn with_capacity(capacity: usize) -> Result<Self, TrieError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity.max(1))
            .map_err(|_| TrieError::OutOfMemory)?;
        Ok(ByteBuf { bytes })
    }

    fn push(&mut self, byte: u8) -> Result<(), TrieError> {
        if self.bytes.len() == self.bytes.capacity() {
            let doubled = self.bytes.capacity() * 2;
            self.bytes
                .try_reserve_exact(doubled - self.bytes.len())
                .map_err(|_| TrieError::OutOfMemory)?;
        }
        self.bytes.push(byte);
        Ok(())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

// =============================================================================
// Trie
// =============================================================================

/// A byte-keyed map stored as a sibling-chained character trie in a single
/// index-linked cell array.
///
/// At each cell the walk either consumes the next key byte and follows the
/// child link (on a character match) or keeps the byte and follows the
/// sibling link (on a mismatch). Keys are matched byte-for-byte; there is no
/// Unicode awareness. The terminator byte `0` ends a key, so a key
/// effectively stops at its first `0` byte, and a key starting with `0` is
/// the empty key.
///
/// Cell storage grows by amortized doubling. Growth is fallible and reported
/// as [`TrieError::OutOfMemory`]; a failed growth never disturbs existing
/// cells, and indices handed out earlier stay valid forever (cells are never
/// removed individually). Dropping the trie releases the whole cell array at
/// once.
#[derive(Clone, Debug)]
pub struct Trie<V> {
    nodes: Vec<Node<V>>,
}

impl<V> Trie<V> {
    /// Creates an empty trie with the default initial cell capacity.
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(DEFAULT_NODE_CAPACITY);
        nodes.push(Node::fresh(ROOT_CHARACTER));
        Trie { nodes }
    }

    /// Creates an empty trie with room for `initial_capacity` cells.
    ///
    /// A capacity of 0 is clamped to 1 (the root always occupies one slot).
    pub fn with_node_capacity(initial_capacity: usize) -> Result<Self, TrieError> {
        let mut trie = Trie { nodes: Vec::new() };
        trie.grow(initial_capacity.max(1))?;
        trie.nodes.push(Node::fresh(ROOT_CHARACTER));
        Ok(trie)
    }

    /// Number of cells in use, root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of cell slots currently allocated.
    #[inline]
    pub fn node_capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// `true` while the trie holds no cell beyond the root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Bytes of heap memory held by the cell array.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node<V>>()
    }

    /// Reserves cell slots so that capacity is at least `new_capacity`.
    /// On failure the array, and every cell in it, is untouched.
    fn grow(&mut self, new_capacity: usize) -> Result<(), TrieError> {
        let additional = new_capacity.saturating_sub(self.nodes.len());
        self.nodes
            .try_reserve_exact(additional)
            .map_err(|_| TrieError::OutOfMemory)
    }

    /// Appends a fresh cell, doubling capacity first when full, and returns
    /// its index. On growth failure the array is unchanged.
    fn append_node(&mut self, character: u8) -> Result<NodeRef, TrieError> {
        if self.nodes.len() == self.nodes.capacity() {
            let doubled = self.nodes.capacity() * 2;
            self.grow(doubled)?;
        }
        let idx = NodeRef::new(self.nodes.len());
        self.nodes.push(Node::fresh(character));
        Ok(idx)
    }

    /// Inserts `value` under `key`, returning the previous value if the key
    /// was already present (no new cells are created in that case).
    ///
    /// The path for a key of length `n` allocates up to `n + 1` cells: each
    /// child link is pre-seeded with the byte that follows it in the key, so
    /// the final child naturally carries the terminator and becomes the
    /// value-bearing terminal.
    ///
    /// Cells appended before a growth failure remain part of the structure
    /// (no rollback); the partial path is harmless and reads as not-found.
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>, TrieError> {
        if key.first().map_or(true, |&b| b == TERMINATOR) {
            return Err(TrieError::EmptyKey);
        }

        let mut idx = NodeRef::ROOT;
        let mut pos = 0usize;
        loop {
            let sym = key.get(pos).copied().unwrap_or(TERMINATOR);
            let node = &self.nodes[idx.index()];
            if node.character == sym {
                if sym == TERMINATOR {
                    match &mut self.nodes[idx.index()].slot {
                        Slot::Terminal { value: stored, .. } => return Ok(stored.replace(value)),
                        Slot::Branch { .. } => {
                            unreachable!("terminator character on a branch cell")
                        }
                    }
                }
                let mut child = node.child();
                if child.is_none() {
                    // Pre-seed the child with the byte that follows in the
                    // key; at the last byte that is the terminator itself.
                    let next = key.get(pos + 1).copied().unwrap_or(TERMINATOR);
                    child = self.append_node(next)?;
                    self.nodes[idx.index()].set_child(child);
                }
                idx = child;
                pos += 1;
            } else {
                let mut sibling = node.sibling();
                if sibling.is_none() {
                    sibling = self.append_node(sym)?;
                    self.nodes[idx.index()].set_sibling(sibling);
                }
                idx = sibling;
            }
        }
    }

    /// Walks `key` (plus its implicit terminator) and returns the terminal
    /// cell it ends on, if the full path exists.
    fn find_terminal(&self, key: &[u8]) -> Option<NodeRef> {
        if key.first().map_or(true, |&b| b == TERMINATOR) {
            return None;
        }

        let mut idx = NodeRef::ROOT;
        let mut pos = 0usize;
        loop {
            let sym = key.get(pos).copied().unwrap_or(TERMINATOR);
            let node = &self.nodes[idx.index()];
            if node.character == sym {
                if sym == TERMINATOR {
                    return Some(idx);
                }
                let child = node.child();
                if child.is_none() {
                    return None;
                }
                idx = child;
                pos += 1;
            } else {
                let sibling = node.sibling();
                if sibling.is_none() {
                    return None;
                }
                idx = sibling;
            }
        }
    }

    /// Returns the value stored under `key`, or `None` if the key is absent
    /// or empty.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let idx = self.find_terminal(key)?;
        match &self.nodes[idx.index()].slot {
            Slot::Terminal { value, .. } => value.as_ref(),
            Slot::Branch { .. } => None,
        }
    }

    /// Mutable variant of [`Trie::get`].
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let idx = self.find_terminal(key)?;
        match &mut self.nodes[idx.index()].slot {
            Slot::Terminal { value, .. } => value.as_mut(),
            Slot::Branch { .. } => None,
        }
    }

    /// `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Reconstructs some stored key sharing a prefix with `key` (which may be
    /// empty).
    ///
    /// While input bytes match, the walk behaves like lookup: it ends at a
    /// terminal only once the input is exhausted or the terminal has no
    /// sibling left to try; a terminal heading an alternatives chain defers
    /// to its sibling while input remains. Once the input is exhausted, or a
    /// mismatch lands on a cell with no sibling, the walk commits to that
    /// cell and completes by following child links only, collecting each
    /// cell's character until a terminal ends the key. The result is a
    /// reproducible function of insertion history: at a divergence the
    /// first-inserted branch wins, and siblings are never reconsulted after
    /// the walk has committed, even when a closer match exists down one. In
    /// particular, a stored key suggests itself unless a longer key was
    /// first to claim the cell at which the input exhausts, in which case
    /// the walk commits there and completes to that stored extension.
    ///
    /// The returned bytes carry no trailing terminator. If the walk runs out
    /// of cells (empty trie, or a partial path from a failed insert), the
    /// bytes collected so far are returned.
    pub fn suggest(&self, key: &[u8]) -> Result<Vec<u8>, TrieError> {
        let mut out = ByteBuf::with_capacity(SUGGEST_BUF_CAPACITY)?;
        let mut idx = NodeRef::ROOT;
        let mut pos = 0usize;
        loop {
            let node = &self.nodes[idx.index()];
            let sym = key.get(pos).copied().filter(|&b| b != TERMINATOR);
            if node.character == TERMINATOR {
                // A terminal heading an alternatives chain (one stored key
                // is a strict prefix of another) ends the walk only once the
                // input is exhausted; remaining input may still match a
                // sibling, exactly as in lookup.
                let sibling = node.sibling();
                if sym.is_none() || sibling.is_none() {
                    return Ok(out.into_bytes());
                }
                idx = sibling;
                continue;
            }
            let next = match sym {
                Some(b) if b == node.character => {
                    out.push(b)?;
                    pos += 1;
                    node.child()
                }
                Some(_) if !node.sibling().is_none() => node.sibling(),
                // Input exhausted, or a dead-end mismatch: commit to this
                // cell and complete along child links only.
                _ => {
                    out.push(node.character)?;
                    node.child()
                }
            };
            if next.is_none() {
                return Ok(out.into_bytes());
            }
            idx = next;
        }
    }

    /// Overwrites `self` with a cell-for-cell copy of `source`.
    ///
    /// Grows `self` first if its capacity is below `source.node_count()`; a
    /// growth failure leaves `self` at its prior, still-valid state. Links
    /// are indices, so the copied cells need no fix-up and the result is
    /// structurally identical to `source`. Whatever `self` previously held
    /// is discarded, so clone into a fresh or equally discardable trie.
    pub fn copy_from(&mut self, source: &Trie<V>) -> Result<(), TrieError>
    where
        V: Clone,
    {
        if self.nodes.capacity() < source.nodes.len() {
            self.grow(source.nodes.len())?;
        }
        self.nodes.clear();
        self.nodes.extend(source.nodes.iter().cloned());
        Ok(())
    }
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================


#[cfg(test)]
mod proptests;
