//! A `Code`: the list of basic blocks owned by a function body or a global
//! initialiser (spec §3).

use crate::basic_block::BasicBlock;
use crate::ids::BasicBlockId;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Code {
    blocks: Vec<BasicBlock>,
    entry: BasicBlockId,
    exit: Option<BasicBlockId>,
}

impl Code {
    pub fn new(entry: BasicBlockId) -> Self {
        Code {
            blocks: vec![BasicBlock::new(entry)],
            entry,
            exit: None,
        }
    }

    pub fn entry(&self) -> BasicBlockId {
        self.entry
    }

    pub fn exit(&self) -> Option<BasicBlockId> {
        self.exit
    }

    pub fn set_exit(&mut self, exit: BasicBlockId) {
        self.exit = Some(exit);
    }

    pub fn add_block(&mut self) -> BasicBlockId {
        let id = BasicBlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id));
        id
    }

    pub fn block(&self, id: BasicBlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BasicBlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Add a directed edge `from -> to`, maintaining both adjacency lists.
    pub fn add_edge(&mut self, from: BasicBlockId, to: BasicBlockId) {
        self.blocks[from.0 as usize].successors.push(to);
        self.blocks[to.0 as usize].predecessors.push(from);
    }

    pub fn successors(&self, id: BasicBlockId) -> &[BasicBlockId] {
        &self.blocks[id.0 as usize].successors
    }

    pub fn predecessors(&self, id: BasicBlockId) -> &[BasicBlockId] {
        &self.blocks[id.0 as usize].predecessors
    }
}
