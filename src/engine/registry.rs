//! Node Registry - Index allocation for parallel arrays.
//!
//! Manages the lifecycle of node indices:
//! - ID ↔ Index bidirectional mapping
//! - Free index pool for O(1) reuse
//! - Per-index generation counter so stale handles can be detected after reuse
//! - Parent context stack for nested node creation
//! - Destroy callbacks

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use super::arrays;

// =============================================================================
// Node Handle
// =============================================================================

/// A reference to a mounted node that knows when it has gone stale.
///
/// Indices are reused after release. The generation distinguishes the node a
/// callback was created for from whatever occupies the index later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub index: usize,
    pub generation: u64,
}

impl NodeHandle {
    /// Whether the node this handle was created for is still mounted.
    pub fn is_live(&self) -> bool {
        is_allocated(self.index) && generation_of(self.index) == self.generation
    }
}

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Map node ID to array index.
    static ID_TO_INDEX: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());

    /// Map array index to node ID.
    static INDEX_TO_ID: RefCell<HashMap<usize, String>> = RefCell::new(HashMap::new());

    /// Set of currently allocated indices (ordered for deterministic iteration).
    static ALLOCATED_INDICES: RefCell<BTreeSet<usize>> = RefCell::new(BTreeSet::new());

    /// Generation per index, bumped on every allocation.
    static GENERATIONS: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };

    /// Parent index per allocated index.
    static PARENTS: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };

    /// Counter for generating unique IDs.
    static ID_COUNTER: RefCell<usize> = const { RefCell::new(0) };

    /// Stack of parent indices for nested node creation.
    static PARENT_STACK: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };

    /// Destroy callbacks registered per index, keyed for removal.
    static DESTROY_CALLBACKS: RefCell<HashMap<usize, Vec<(DestroyId, Box<dyn FnOnce()>)>>> = RefCell::new(HashMap::new());

    /// Next destroy callback key.
    static NEXT_DESTROY_ID: RefCell<u64> = const { RefCell::new(1) };
}

// =============================================================================
// Parent Context Stack
// =============================================================================

/// Get current parent index (None if at root).
pub fn get_current_parent_index() -> Option<usize> {
    PARENT_STACK.with(|stack| stack.borrow().last().copied())
}

/// Push a parent index onto the stack.
pub fn push_parent_context(index: usize) {
    PARENT_STACK.with(|stack| stack.borrow_mut().push(index));
}

/// Pop a parent index from the stack.
pub fn pop_parent_context() {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });
}

/// Get the parent of an allocated index.
pub fn get_parent_index(index: usize) -> Option<usize> {
    PARENTS.with(|parents| parents.borrow().get(&index).copied())
}

// =============================================================================
// Index Allocation
// =============================================================================

/// Allocate an index for a new node.
///
/// If `id` names a node that is already allocated, its existing handle is
/// returned.
pub fn allocate_index(id: Option<&str>) -> NodeHandle {
    let node_id = match id {
        Some(id) => id.to_string(),
        None => ID_COUNTER.with(|counter| {
            let mut counter = counter.borrow_mut();
            let id = format!("n{}", *counter);
            *counter += 1;
            id
        }),
    };

    let existing = ID_TO_INDEX.with(|map| map.borrow().get(&node_id).copied());
    if let Some(index) = existing {
        return NodeHandle { index, generation: generation_of(index) };
    }

    let index = FREE_INDICES.with(|free| free.borrow_mut().pop()).unwrap_or_else(|| {
        NEXT_INDEX.with(|next| {
            let mut next = next.borrow_mut();
            let index = *next;
            *next += 1;
            index
        })
    });

    let generation = GENERATIONS.with(|gens| {
        let mut gens = gens.borrow_mut();
        if gens.len() <= index {
            gens.resize(index + 1, 0);
        }
        gens[index] += 1;
        gens[index]
    });

    ID_TO_INDEX.with(|map| map.borrow_mut().insert(node_id.clone(), index));
    INDEX_TO_ID.with(|map| map.borrow_mut().insert(index, node_id));
    ALLOCATED_INDICES.with(|set| set.borrow_mut().insert(index));

    if let Some(parent) = get_current_parent_index() {
        PARENTS.with(|parents| parents.borrow_mut().insert(index, parent));
    }

    arrays::ensure_all_capacity(index);

    log::trace!("[REGISTRY] allocated index {index} (generation {generation})");
    NodeHandle { index, generation }
}

/// Release an index back to the pool.
///
/// Also recursively releases all children.
pub fn release_index(index: usize) {
    let id = INDEX_TO_ID.with(|map| map.borrow().get(&index).cloned());
    let Some(id) = id else { return };

    let children: Vec<usize> = PARENTS.with(|parents| {
        parents
            .borrow()
            .iter()
            .filter(|&(_, &parent)| parent == index)
            .map(|(&child, _)| child)
            .collect()
    });
    for child in children {
        release_index(child);
    }

    run_destroy_callbacks(index);

    ID_TO_INDEX.with(|map| map.borrow_mut().remove(&id));
    INDEX_TO_ID.with(|map| map.borrow_mut().remove(&index));
    ALLOCATED_INDICES.with(|set| set.borrow_mut().remove(&index));
    PARENTS.with(|parents| parents.borrow_mut().remove(&index));

    arrays::clear_all_at_index(index);

    FREE_INDICES.with(|free| free.borrow_mut().push(index));
    log::trace!("[REGISTRY] released index {index}");

    // When everything is gone, reset the arrays to free memory. Generations are
    // kept so handles from before the reset stay stale.
    let is_empty = ALLOCATED_INDICES.with(|set| set.borrow().is_empty());
    if is_empty {
        arrays::reset_all_arrays();
    }
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Key of a registered destroy callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestroyId(u64);

/// Register a callback to run when the node at `index` is destroyed.
pub fn on_destroy(index: usize, callback: impl FnOnce() + 'static) -> DestroyId {
    let id = NEXT_DESTROY_ID.with(|next| {
        let mut next = next.borrow_mut();
        let id = DestroyId(*next);
        *next += 1;
        id
    });
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(index)
            .or_default()
            .push((id, Box::new(callback)));
    });
    id
}

/// Drop a destroy callback without running it. Returns false if it already ran.
pub fn remove_destroy_callback(index: usize, id: DestroyId) -> bool {
    DESTROY_CALLBACKS.with(|callbacks| {
        let mut callbacks = callbacks.borrow_mut();
        let Some(list) = callbacks.get_mut(&index) else { return false };
        let before = list.len();
        list.retain(|(entry, _)| *entry != id);
        let removed = list.len() != before;
        if list.is_empty() {
            callbacks.remove(&index);
        }
        removed
    })
}

/// Number of destroy callbacks waiting on `index`.
pub fn destroy_callback_count(index: usize) -> usize {
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow().get(&index).map_or(0, Vec::len))
}

/// Run and clear destroy callbacks for an index.
fn run_destroy_callbacks(index: usize) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&index));
    if let Some(callbacks) = callbacks {
        for (_, callback) in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Get index for a node ID.
pub fn get_index(id: &str) -> Option<usize> {
    ID_TO_INDEX.with(|map| map.borrow().get(id).copied())
}

/// Get ID for an index.
pub fn get_id(index: usize) -> Option<String> {
    INDEX_TO_ID.with(|map| map.borrow().get(&index).cloned())
}

/// Get all currently allocated indices in ascending order.
pub fn get_allocated_indices() -> Vec<usize> {
    ALLOCATED_INDICES.with(|set| set.borrow().iter().copied().collect())
}

/// Check if an index is currently allocated.
pub fn is_allocated(index: usize) -> bool {
    ALLOCATED_INDICES.with(|set| set.borrow().contains(&index))
}

/// Current generation of an index (0 if it was never allocated).
pub fn generation_of(index: usize) -> u64 {
    GENERATIONS.with(|gens| gens.borrow().get(index).copied().unwrap_or(0))
}

/// Get the count of currently allocated nodes.
pub fn get_allocated_count() -> usize {
    ALLOCATED_INDICES.with(|set| set.borrow().len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
pub fn reset_registry() {
    ID_TO_INDEX.with(|map| map.borrow_mut().clear());
    INDEX_TO_ID.with(|map| map.borrow_mut().clear());
    ALLOCATED_INDICES.with(|set| set.borrow_mut().clear());
    GENERATIONS.with(|gens| gens.borrow_mut().clear());
    PARENTS.with(|parents| parents.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    ID_COUNTER.with(|counter| *counter.borrow_mut() = 0);
    PARENT_STACK.with(|stack| stack.borrow_mut().clear());
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
    arrays::reset_all_arrays();
}
