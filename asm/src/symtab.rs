use indexmap::IndexMap;
use xpvm_arch::Format;

use crate::error::UserError;

/// One symbolic operand: the address of the referencing instruction and the
/// format that decides how many bits the PC-relative offset gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub addr: u32,
    pub format: Format,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub defined: bool,
    /// Only meaningful when `defined`.
    pub addr: u32,
    pub referenced: bool,
    pub exported: bool,
    pub imported: bool,
    references: Vec<Reference>,
}

impl Symbol {
    fn new(name: &str) -> Self {
        Symbol {
            name: name.to_string(),
            defined: false,
            addr: 0,
            referenced: false,
            exported: false,
            imported: false,
            references: Vec::new(),
        }
    }

    pub fn address(&self) -> Option<u32> {
        self.defined.then_some(self.addr)
    }
}

/// Handle to a symbol. Symbols are never removed, so a handle stays valid
/// for the lifetime of the table that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get_index_of(name).map(SymbolId)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    fn entry(&mut self, name: &str) -> &mut Symbol {
        if let Some(idx) = self.symbols.get_index_of(name) {
            return &mut self.symbols[idx];
        }
        self.symbols
            .entry(name.to_string())
            .or_insert_with(|| Symbol::new(name))
    }

    /// Define `name` at `addr`. A second definition fails and leaves the
    /// first address in place.
    pub fn install_definition(&mut self, name: &str, addr: u32) -> Result<(), UserError> {
        let sym = self.entry(name);
        if sym.defined {
            return Err(UserError::AlreadyDefined(name.to_string()));
        }
        sym.defined = true;
        sym.addr = addr;
        Ok(())
    }

    pub fn install_reference(&mut self, name: &str, addr: u32, format: Format) {
        let sym = self.entry(name);
        sym.referenced = true;
        sym.references.push(Reference { addr, format });
    }

    pub fn install_export(&mut self, name: &str) -> Result<(), UserError> {
        let sym = self.entry(name);
        if sym.exported {
            return Err(UserError::ExportedTwice(name.to_string()));
        }
        sym.exported = true;
        Ok(())
    }

    pub fn install_import(&mut self, name: &str) -> Result<(), UserError> {
        let sym = self.entry(name);
        if sym.imported {
            return Err(UserError::ImportedTwice(name.to_string()));
        }
        sym.imported = true;
        Ok(())
    }

    /// Every symbol. The order is not part of the table's contract.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .values()
            .enumerate()
            .map(|(idx, sym)| (SymbolId(idx), sym))
    }

    pub fn references_of(&self, id: SymbolId) -> impl Iterator<Item = &Reference> {
        self.get(id).references.iter()
    }

    /// Defined labels with their addresses, in order of first mention.
    pub fn defined_labels(&self) -> impl Iterator<Item = (&str, u32)> {
        self.symbols
            .values()
            .filter_map(|sym| sym.address().map(|addr| (sym.name.as_str(), addr)))
    }
}
