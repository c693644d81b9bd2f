//! Weak topological ordering (spec §4.6): Bourdoncle's recursive algorithm,
//! computed once per [`Code`] and cached on the fixpoint table that owns it.
//!
//! Grounded on the algorithm from Bourdoncle's *Efficient chaotic iteration
//! strategies with widenings* (the paper `original_source`'s own
//! `wto.hpp` was filtered out of the retrieval pack implements, recovered
//! here from first principles rather than translated from a header we don't
//! have) and on `fuel-vm`'s CFG-adjacent modules for how a Rust crate in
//! this corpus shapes a recursive graph algorithm (explicit stack state
//! instead of closures capturing `&mut self`, to sidestep borrow conflicts
//! between the recursive visit and the partition it builds).

use std::collections::HashMap;

use ikos_ar::{BasicBlockId, Code};

/// One element of a [`Wto`]: either a plain vertex, or a cycle whose first
/// element is the *head* the fixpoint iterator widens/narrows at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WtoComponent {
    Vertex(BasicBlockId),
    Cycle {
        head: BasicBlockId,
        body: Vec<WtoComponent>,
    },
}

impl WtoComponent {
    pub fn head(&self) -> BasicBlockId {
        match self {
            WtoComponent::Vertex(v) => *v,
            WtoComponent::Cycle { head, .. } => *head,
        }
    }
}

/// The WTO of a [`Code`]'s CFG: a nested sequence of [`WtoComponent`]s in
/// traversal order, rooted at `code.entry()`.
#[derive(Debug, Clone)]
pub struct Wto {
    components: Vec<WtoComponent>,
}

impl Wto {
    pub fn compute(code: &Code) -> Self {
        let mut builder = Builder {
            code,
            dfn: HashMap::new(),
            num: 0,
            stack: Vec::new(),
        };
        let mut partition = Vec::new();
        builder.visit(code.entry(), &mut partition);
        Wto { components: partition }
    }

    pub fn components(&self) -> &[WtoComponent] {
        &self.components
    }

    /// Every vertex in traversal order, flattening nested cycles.
    pub fn iter_vertices(&self) -> impl Iterator<Item = BasicBlockId> + '_ {
        fn flatten<'a>(components: &'a [WtoComponent], out: &mut Vec<BasicBlockId>) {
            for c in components {
                match c {
                    WtoComponent::Vertex(v) => out.push(*v),
                    WtoComponent::Cycle { head, body } => {
                        out.push(*head);
                        flatten(body, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        flatten(&self.components, &mut out);
        out.into_iter()
    }
}

/// Sentinel `dfn` value meaning "fully processed, never revisit" (the
/// algorithm's `+infinity`).
const DONE: u32 = u32::MAX;

struct Builder<'a> {
    code: &'a Code,
    dfn: HashMap<BasicBlockId, u32>,
    num: u32,
    stack: Vec<BasicBlockId>,
}

impl<'a> Builder<'a> {
    fn visit(&mut self, v: BasicBlockId, partition: &mut Vec<WtoComponent>) -> u32 {
        self.stack.push(v);
        self.num += 1;
        self.dfn.insert(v, self.num);
        let mut head = self.num;
        let mut is_loop = false;
        for &w in self.code.successors(v) {
            let min = match self.dfn.get(&w).copied() {
                None => self.visit(w, partition),
                Some(d) => d,
            };
            if min < head {
                head = min;
                is_loop = true;
            }
        }
        if head == *self.dfn.get(&v).expect("just inserted") {
            self.dfn.insert(v, DONE);
            let mut element = self.stack.pop().expect("v itself is on the stack");
            if is_loop {
                while element != v {
                    self.dfn.insert(element, 0);
                    element = self.stack.pop().expect("v is still below on the stack");
                }
                let body = self.component(v);
                partition.insert(0, WtoComponent::Cycle { head: v, body });
            } else {
                partition.insert(0, WtoComponent::Vertex(v));
            }
        }
        head
    }

    /// Builds the nested body of the cycle headed at `v`: every successor of
    /// `v` not yet (re-)visited, recursively partitioned the same way.
    fn component(&mut self, v: BasicBlockId) -> Vec<WtoComponent> {
        let mut partition = Vec::new();
        let successors: Vec<BasicBlockId> = self.code.successors(v).to_vec();
        for w in successors {
            if self.dfn.get(&w).copied().unwrap_or(0) == 0 {
                self.visit(w, &mut partition);
            }
        }
        partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_ar::BasicBlockId;

    fn linear_code() -> Code {
        let mut code = Code::new(BasicBlockId(0));
        let b1 = code.add_block();
        let b2 = code.add_block();
        code.add_edge(BasicBlockId(0), b1);
        code.add_edge(b1, b2);
        code
    }

    fn loop_code() -> Code {
        // entry -> header -> body -> header (back edge), header -> exit
        let mut code = Code::new(BasicBlockId(0));
        let header = code.add_block();
        let body = code.add_block();
        let exit = code.add_block();
        code.add_edge(BasicBlockId(0), header);
        code.add_edge(header, body);
        code.add_edge(body, header);
        code.add_edge(header, exit);
        code
    }

    #[test]
    fn a_linear_cfg_has_no_cycle_components() {
        let code = linear_code();
        let wto = Wto::compute(&code);
        assert!(wto
            .components()
            .iter()
            .all(|c| matches!(c, WtoComponent::Vertex(_))));
        let order: Vec<_> = wto.iter_vertices().collect();
        assert_eq!(order, vec![BasicBlockId(0), BasicBlockId(1), BasicBlockId(2)]);
    }

    #[test]
    fn a_back_edge_produces_a_cycle_component_headed_at_the_loop_header() {
        let code = loop_code();
        let wto = Wto::compute(&code);
        let header = BasicBlockId(1);
        let cycle = wto
            .components()
            .iter()
            .find(|c| matches!(c, WtoComponent::Cycle { head, .. } if *head == header))
            .expect("loop header produces a cycle component");
        assert_eq!(cycle.head(), header);
    }

    #[test]
    fn iter_vertices_covers_every_block_exactly_once() {
        let code = loop_code();
        let wto = Wto::compute(&code);
        let mut order: Vec<_> = wto.iter_vertices().collect();
        order.sort_by_key(|b| b.0);
        assert_eq!(
            order,
            vec![BasicBlockId(0), BasicBlockId(1), BasicBlockId(2), BasicBlockId(3)]
        );
    }
}
