//! Interned call contexts: the linked list of `(caller call-site, callee)`
//! pairs that distinguishes recursive-inlining invocations of the same
//! function under different call paths (spec §3, §4.7).

use std::collections::HashMap;
use std::sync::RwLock;

use crate::ids::{CallSiteId, FunctionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallContextId(u32);

impl CallContextId {
    /// The empty call context: analysing a function as an entry point, with
    /// no enclosing call.
    pub const ROOT: CallContextId = CallContextId(0);

    pub fn index(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Node {
    call_site: CallSiteId,
    callee: FunctionId,
    parent: CallContextId,
}

/// Append-only interning arena for [`CallContextId`]s. Safe to share a
/// `&CallContextFactory` across an analysis (spec §5): lookups take a read
/// lock, insertions a write lock, never held concurrently with a fixpoint
/// mutation since the core itself is single-threaded.
#[derive(Debug, Default)]
pub struct CallContextFactory {
    nodes: RwLock<Vec<Node>>,
    index: RwLock<HashMap<Node, CallContextId>>,
}

impl CallContextFactory {
    pub fn new() -> Self {
        CallContextFactory {
            nodes: RwLock::new(vec![Node {
                call_site: CallSiteId(0),
                callee: FunctionId(0),
                parent: CallContextId::ROOT,
            }]),
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Extend `parent` with one more `(call_site, callee)` frame, returning
    /// the existing interned id if this exact path was already built.
    pub fn extend(
        &self,
        parent: CallContextId,
        call_site: CallSiteId,
        callee: FunctionId,
    ) -> CallContextId {
        let node = Node {
            call_site,
            callee,
            parent,
        };
        if let Some(id) = self.index.read().unwrap().get(&node) {
            return *id;
        }
        let mut nodes = self.nodes.write().unwrap();
        let mut index = self.index.write().unwrap();
        if let Some(id) = index.get(&node) {
            return *id;
        }
        let id = CallContextId(nodes.len() as u32);
        nodes.push(node);
        index.insert(node, id);
        id
    }

    /// `true` if `callee` already appears somewhere on the call path ending
    /// at `context`, used by the inlining call-execution engine to bound
    /// recursion (spec §4.7 mentions a "per-callee cache", which this
    /// recursion check complements: it is what lets the cache be a cache
    /// rather than infinite unrolling).
    pub fn contains_callee(&self, mut context: CallContextId, callee: FunctionId) -> bool {
        let nodes = self.nodes.read().unwrap();
        loop {
            if context == CallContextId::ROOT {
                return false;
            }
            let node = nodes[context.0 as usize];
            if node.callee == callee {
                return true;
            }
            context = node.parent;
        }
    }

    /// Depth of the call context (0 for `ROOT`).
    pub fn depth(&self, mut context: CallContextId) -> usize {
        let nodes = self.nodes.read().unwrap();
        let mut depth = 0;
        while context != CallContextId::ROOT {
            depth += 1;
            context = nodes[context.0 as usize].parent;
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_paths_intern_to_the_same_id() {
        let factory = CallContextFactory::new();
        let a = factory.extend(CallContextId::ROOT, CallSiteId(1), FunctionId(7));
        let b = factory.extend(CallContextId::ROOT, CallSiteId(1), FunctionId(7));
        assert_eq!(a, b);
    }

    #[test]
    fn recursion_is_detected_along_the_path() {
        let factory = CallContextFactory::new();
        let f = FunctionId(3);
        let ctx = factory.extend(CallContextId::ROOT, CallSiteId(1), f);
        let ctx2 = factory.extend(ctx, CallSiteId(2), FunctionId(4));
        assert!(factory.contains_callee(ctx2, f));
        assert!(!factory.contains_callee(ctx2, FunctionId(99)));
    }
}
