use bimap::BiMap;
use serde::{Deserialize, Serialize};

use crate::{stmt::Statement, symtab::SymbolTable};

// ----------------------------------------------------------------------------
// Exception handler

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandlerAddrs {
    pub handle: u32,
    pub start: u32,
    pub end: u32,
}

/// Exception handler of a block: code between `start` and `end` transfers
/// to `handle` when an exception is raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub handle: String,
    pub start: String,
    pub end: String,
    #[serde(skip)]
    pub addrs: Option<HandlerAddrs>,
}

impl Handler {
    pub fn new(handle: &str, start: &str, end: &str) -> Self {
        Handler {
            handle: handle.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            addrs: None,
        }
    }

    /// Look the three labels up. Returns the labels that are not defined;
    /// the addresses are only stored when all of them are.
    pub fn resolve(&mut self, symbols: &SymbolTable) -> Vec<String> {
        let addr = |name: &str| symbols.find(name).and_then(|sym| sym.address());
        let (handle, start, end) = (addr(&self.handle), addr(&self.start), addr(&self.end));
        if let (Some(handle), Some(start), Some(end)) = (handle, start, end) {
            self.addrs = Some(HandlerAddrs { handle, start, end });
            return vec![];
        }
        [(handle, &self.handle), (start, &self.start), (end, &self.end)]
            .into_iter()
            .filter(|(addr, _)| addr.is_none())
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// `(start, end, handle)` as byte addresses, once resolved.
    pub fn triple(&self) -> Option<(u32, u32, u32)> {
        self.addrs.map(|a| (a.start * 4, a.end * 4, a.handle * 4))
    }
}

// ----------------------------------------------------------------------------
// Block

/// Number of statements that carry an instruction or directive.
pub fn length_of(statements: &[Statement]) -> u32 {
    statements.iter().filter(|stmt| stmt.instr.is_some()).count() as u32
}

/// A function: named statements plus their exception handler table.
#[derive(Debug, Clone)]
pub struct Block {
    pub name: String,
    pub index: u32,
    /// Address of the first word of the block.
    pub addr: u32,
    /// Words the block occupies, measured in pass 1.
    pub span: u32,
    pub statements: Vec<Statement>,
    pub handlers: Vec<Handler>,
}

impl Block {
    pub fn length(&self) -> u32 {
        length_of(&self.statements)
    }

    pub fn handler_count(&self) -> u32 {
        self.handlers.len() as u32
    }
}

/// Blocks in declaration order, with a name index for `ldblkid`.
#[derive(Debug, Default)]
pub struct Blocks {
    blocks: Vec<Block>,
    names: BiMap<String, u32>,
}

impl Blocks {
    pub fn new() -> Self {
        Blocks {
            blocks: Vec::new(),
            names: BiMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn next_index(&self) -> u32 {
        self.blocks.len() as u32
    }

    /// Append a block, giving it the next index. A repeated name keeps
    /// pointing at the first block that used it.
    pub fn declare(&mut self, mut block: Block) -> u32 {
        let index = self.next_index();
        block.index = index;
        let _ = self.names.insert_no_overwrite(block.name.clone(), index);
        self.blocks.push(block);
        index
    }

    pub fn resolve_block_id(&self, name: &str) -> Option<u32> {
        self.names.get_by_left(name).copied()
    }

    pub fn get(&self, index: u32) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut Block> {
        self.blocks.get_mut(index as usize)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }
}
