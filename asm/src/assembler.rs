use std::io::Write;

use xpvm_arch::{encode, fits_in_bits, pc_relative, Fields, Format, Instruction, Opcode, Operands};

use crate::{
    block::{self, Block, Blocks, Handler},
    config::Config,
    error::{bug, Error, UserError},
    msg::{Diagnostic, Reporter},
    object::{EncodedBlock, ObjectWriter},
    program::Program,
    stmt::{Location, Statement},
    symtab::SymbolTable,
    util,
};

/// Largest word count a program may occupy.
pub const MAX_WORDS: u32 = (1 << 20) - 1;

/// Longest imported or exported name, in bytes.
pub const MAX_LINK_NAME: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Pass1,
    BetweenPasses,
    Pass2,
}

/// `ldblkid` target waiting for every block to be declared.
#[derive(Debug, Clone)]
struct BlockRef {
    name: String,
    loc: Option<Location>,
    context: String,
}

/// One assembly from the first statement to the last emitted word.
///
/// Statements are fed in source order during pass 1, then
/// [`Assembler::between_passes`] validates the whole program, and pass 2
/// encodes. Pass 2 runs only if no errors were reported.
pub struct Assembler {
    config: Config,
    reporter: Box<dyn Reporter>,
    state: State,
    symbols: SymbolTable,
    blocks: Blocks,
    block_refs: Vec<BlockRef>,
    current_length: u32,
    error_count: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Assembler {
    pub fn new(config: Config, reporter: Box<dyn Reporter>) -> Self {
        Assembler {
            config,
            reporter,
            state: State::Pass1,
            symbols: SymbolTable::new(),
            blocks: Blocks::new(),
            block_refs: Vec::new(),
            current_length: 0,
            error_count: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn blocks(&self) -> &Blocks {
        &self.blocks
    }

    /// Address of the next word.
    pub fn current_length(&self) -> u32 {
        self.current_length
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Everything reported so far, warnings included.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn resolve_block_id(&self, name: &str) -> Option<u32> {
        self.blocks.resolve_block_id(name)
    }

    fn report(&mut self, diag: Diagnostic) {
        if diag.is_error() {
            self.error_count += 1;
        }
        self.reporter.report(&diag);
        self.diagnostics.push(diag);
    }

    fn error_at(&mut self, error: UserError, stmt: &Statement) {
        let diag = Diagnostic::error(error).at(stmt.loc.as_ref(), Some(stmt.to_string()));
        self.report(diag);
    }

    fn expect_state(&self, state: State, what: &str) -> Result<(), Error> {
        if self.state != state {
            bug!("{what} called during {:?}", self.state);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Statements

    /// Feed one statement. Pass 1 records it and returns no words; pass 2
    /// returns the words it encodes to.
    pub fn process_statement(&mut self, stmt: &Statement) -> Result<Vec<u32>, Error> {
        match self.state {
            State::Pass1 => {
                self.measure(stmt);
                Ok(vec![])
            }
            State::Pass2 => self.emit(stmt),
            State::BetweenPasses => bug!("statement `{stmt}` fed between passes"),
        }
    }

    fn measure(&mut self, stmt: &Statement) {
        if let Some(label) = &stmt.label {
            if let Err(e) = self.symbols.install_definition(label, self.current_length) {
                self.error_at(e, stmt);
            }
        }
        let Some(instr) = &stmt.instr else {
            return;
        };
        self.current_length = self.current_length.saturating_add(1);
        let Some(op) = self.check_shape(instr, stmt) else {
            return;
        };
        let here = self.current_length - 1;

        match (op, &instr.operands) {
            (Opcode::Alloc, &Operands::Const(c)) => {
                let c = if c > 0 {
                    c
                } else {
                    self.error_at(UserError::NonPositiveAlloc, stmt);
                    0
                };
                // the clamped zero gives back the provisional word
                self.current_length = match c {
                    0 => self.current_length - 1,
                    c => self.current_length.saturating_add(c as u32 - 1),
                };
            }
            (Opcode::Word, _) => {}
            (Opcode::Export, Operands::Addr(name)) => {
                self.current_length = self.current_length.saturating_sub(1);
                if let Err(e) = self.symbols.install_export(name) {
                    self.error_at(e, stmt);
                }
            }
            (Opcode::Import, Operands::Addr(name)) => {
                self.current_length = self.current_length.saturating_sub(1);
                if let Err(e) = self.symbols.install_import(name) {
                    self.error_at(e, stmt);
                }
            }
            (Opcode::Ldblkid, Operands::RegAddr(_, name)) => {
                self.block_refs.push(BlockRef {
                    name: name.clone(),
                    loc: stmt.loc.clone(),
                    context: stmt.to_string(),
                });
            }
            (_, operands) => {
                if let Some(name) = operands.symbol() {
                    self.symbols.install_reference(name, here, operands.format());
                }
                if let (Some(c), Some(bits)) = (operands.constant(), operands.format().const_bits())
                {
                    if !fits_in_bits(c, bits) {
                        self.error_at(UserError::ConstantRange(c, bits), stmt);
                    }
                }
            }
        }
    }

    /// Known opcode whose operand shape matches, or a reported error.
    fn check_shape(&mut self, instr: &Instruction, stmt: &Statement) -> Option<Opcode> {
        let Some(op) = instr.opcode() else {
            self.error_at(UserError::UnknownOpcode(instr.op.to_string()), stmt);
            return None;
        };
        if op.format() != instr.format() {
            let e = UserError::OperandMismatch {
                op: op.to_string(),
                expected: op.format(),
                found: instr.format(),
            };
            self.error_at(e, stmt);
            return None;
        }
        Some(op)
    }

    fn emit(&mut self, stmt: &Statement) -> Result<Vec<u32>, Error> {
        let Some(instr) = &stmt.instr else {
            return Ok(vec![]);
        };
        self.current_length = self.current_length.saturating_add(1);
        let here = self.current_length - 1;
        let Some(op) = instr.opcode() else {
            bug!("unknown opcode `{}` reached pass 2", instr.op);
        };
        if op.format() != instr.format() {
            bug!("operand shape of `{instr}` reached pass 2");
        }

        let fields = match (op, &instr.operands) {
            (Opcode::Alloc, &Operands::Const(c)) => {
                if c <= 0 {
                    bug!("alloc {c} reached pass 2");
                }
                self.current_length = self.current_length.saturating_add(c as u32 - 1);
                return Ok(vec![0; c as usize]);
            }
            (Opcode::Word, &Operands::Const(c)) => return Ok(vec![c as u32]),
            (Opcode::Import | Opcode::Export, _) => {
                self.current_length = self.current_length.saturating_sub(1);
                return Ok(vec![]);
            }
            (Opcode::Ldblkid, Operands::RegAddr(reg, name)) => {
                let index = match self.blocks.resolve_block_id(name) {
                    Some(index) => index,
                    None if self.config.block_id_fallback => 0,
                    None => bug!("block {name} unresolved in pass 2"),
                };
                Fields::RegConst(*reg, index as i32)
            }
            (_, Operands::Empty) => Fields::Op,
            (_, Operands::Addr(name)) => Fields::Addr(self.encode_addr(name, here, Format::Addr)?),
            (_, &Operands::Reg(reg)) => Fields::Reg(reg),
            (_, &Operands::RegConst(reg, c)) => Fields::RegConst(reg, self.constant(c, 16)?),
            (_, Operands::RegAddr(reg, name)) => {
                Fields::RegAddr(*reg, self.encode_addr(name, here, Format::RegAddr)?)
            }
            (_, &Operands::RegReg(r1, r2)) => Fields::RegReg(r1, r2),
            (_, &Operands::RegRegConst(r1, r2, c)) => Fields::RegRegConst(r1, r2, self.constant(c, 8)?),
            (_, Operands::RegRegAddr(r1, r2, name)) => {
                Fields::RegRegAddr(*r1, *r2, self.encode_addr(name, here, Format::RegRegAddr)?)
            }
            (_, &Operands::RegRegReg(r1, r2, r3)) => Fields::RegRegReg(r1, r2, r3),
            (_, Operands::Const(_)) => bug!("`{instr}` has no encoding"),
        };
        let Some(byte) = op.encoding() else {
            bug!("no encoding for {op}");
        };
        if fields.format() != op.encoded_format() {
            bug!("`{instr}` packed as {}", fields.format());
        }
        Ok(vec![encode(byte, fields)])
    }

    fn constant(&self, c: i32, bits: u8) -> Result<i32, Error> {
        if !fits_in_bits(c, bits) {
            bug!("constant {c} does not fit in {bits} bits in pass 2");
        }
        Ok(c)
    }

    /// PC-relative field for a reference at `here`. Imported symbols that
    /// are not defined here encode as 0 for the loader to patch.
    fn encode_addr(&self, name: &str, here: u32, format: Format) -> Result<i32, Error> {
        let Some(sym) = self.symbols.find(name) else {
            bug!("symbol {name} not found in pass 2");
        };
        let Some(addr) = sym.address() else {
            if sym.imported {
                return Ok(0);
            }
            bug!("symbol {name} neither defined nor imported in pass 2");
        };
        let delta = pc_relative(addr, here);
        let bits = format.addr_bits().unwrap_or(0);
        if !fits_in_bits(delta, bits) {
            bug!("reference to {name} at {here} does not fit in {bits} bits in pass 2");
        }
        Ok(delta)
    }

    // ------------------------------------------------------------------------
    // Functions

    pub fn process_handler(&self, handle: &str, start: &str, end: &str) -> Handler {
        Handler::new(handle, start, end)
    }

    /// Declare a function and run pass 1 over its statements. Returns the
    /// block index.
    pub fn process_function(
        &mut self,
        start: &str,
        end: &str,
        handlers: Vec<Handler>,
        statements: Vec<Statement>,
    ) -> Result<u32, Error> {
        self.expect_state(State::Pass1, "process_function")?;
        if start != end {
            let e = UserError::FunctionMismatch {
                start: start.to_string(),
                end: end.to_string(),
            };
            let loc = statements.first().and_then(|s| s.loc.as_ref());
            let diag = Diagnostic::error(e).at(loc, None);
            self.report(diag);
        }
        let head = Statement {
            loc: statements.first().and_then(|s| s.loc.clone()),
            ..Statement::label(start)
        };
        self.measure(&head);

        let addr = self.current_length;
        for stmt in &statements {
            self.measure(stmt);
        }
        let block = Block {
            name: start.to_string(),
            index: 0,
            addr,
            span: self.current_length.wrapping_sub(addr),
            statements,
            handlers,
        };
        tracing::debug!(
            "function {} at {}: {} statements, {} words, {} handlers",
            block.name,
            block.addr,
            block.length(),
            block.span,
            block.handler_count()
        );
        Ok(self.blocks.declare(block))
    }

    // ------------------------------------------------------------------------
    // Between passes

    /// Program-wide checks over the symbol table. Reads only, so running it
    /// twice gives the same diagnostics.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = vec![];
        let mut error = |e| diags.push(Diagnostic::error(e));

        if self.current_length > MAX_WORDS {
            error(UserError::ProgramTooLarge(self.current_length));
        }

        for (id, sym) in self.symbols.iter() {
            if !sym.referenced {
                continue;
            }
            let Some(addr) = sym.address() else {
                if !sym.imported {
                    error(UserError::Undefined(sym.name.clone()));
                }
                continue;
            };
            for r in self.symbols.references_of(id) {
                let bits = r.format.addr_bits().unwrap_or(0);
                if !fits_in_bits(pc_relative(addr, r.addr), bits) {
                    error(UserError::AddressRange {
                        symbol: sym.name.clone(),
                        addr: r.addr,
                        bits,
                    });
                }
            }
        }

        for (_, sym) in self.symbols.iter() {
            let name = || sym.name.clone();
            if sym.imported && sym.exported {
                error(UserError::ImportedAndExported(name()));
            }
            if sym.imported && sym.defined {
                error(UserError::ImportedAndDefined(name()));
            }
            if sym.imported && !sym.referenced {
                error(UserError::ImportedNotReferenced(name()));
            }
            if sym.exported && !sym.defined {
                error(UserError::ExportedNotDefined(name()));
            }
            if sym.imported && sym.name.len() > MAX_LINK_NAME {
                error(UserError::ImportNameTooLong(name()));
            }
            if sym.exported && sym.name.len() > MAX_LINK_NAME {
                error(UserError::ExportNameTooLong(name()));
            }
        }
        diags
    }

    fn resolve_handlers(&mut self) {
        let mut missing = vec![];
        for block in self.blocks.iter_mut() {
            let loc = block.statements.first().and_then(|s| s.loc.clone());
            for handler in block.handlers.iter_mut() {
                for label in handler.resolve(&self.symbols) {
                    let e = UserError::UnresolvedHandler {
                        label,
                        function: block.name.clone(),
                    };
                    missing.push(Diagnostic::error(e).at(loc.as_ref(), None));
                }
            }
        }
        for diag in missing {
            self.report(diag);
        }
    }

    fn resolve_block_refs(&mut self) {
        for r in std::mem::take(&mut self.block_refs) {
            let diag = match self.blocks.resolve_block_id(&r.name) {
                Some(index) if fits_in_bits(index as i32, 16) => continue,
                Some(index) => Diagnostic::error(UserError::ConstantRange(index as i32, 16)),
                None if self.config.block_id_fallback => {
                    Diagnostic::warn(UserError::UnknownBlock(r.name))
                }
                None => Diagnostic::error(UserError::UnknownBlock(r.name)),
            };
            self.report(diag.at(r.loc.as_ref(), Some(r.context)));
        }
    }

    /// Close pass 1: validate, resolve handlers and block ids, and write
    /// the object header when the program is clean. Returns the error
    /// count; pass 2 may only follow when it is zero.
    pub fn between_passes<W: Write>(&mut self, out: &mut ObjectWriter<W>) -> Result<usize, Error> {
        self.expect_state(State::Pass1, "between_passes")?;
        self.state = State::BetweenPasses;
        tracing::trace!("pass 1 done: {} words", self.current_length);

        for diag in self.validate() {
            self.report(diag);
        }
        self.resolve_handlers();
        self.resolve_block_refs();

        tracing::debug!("symbols: {}", self.symbols.len());
        for (name, addr) in self.symbols.defined_labels() {
            tracing::trace!("label {name} = {addr}");
        }
        if self.config.list_labels {
            util::print_labels(&self.symbols, self.config.color);
        }

        if self.error_count == 0 {
            tracing::trace!("writing header for {} blocks", self.blocks.len());
            out.header(self.blocks.next_index())?;
            self.state = State::Pass2;
        } else {
            tracing::debug!("{} errors, skipping pass 2", self.error_count);
        }
        self.current_length = 0;
        Ok(self.error_count)
    }

    // ------------------------------------------------------------------------
    // Pass 2

    /// Encode every block in declaration order and write it out.
    pub fn encode_functions<W: Write>(&mut self, out: &mut ObjectWriter<W>) -> Result<(), Error> {
        self.expect_state(State::Pass2, "encode_functions")?;
        tracing::trace!("starting pass 2");
        for index in 0..self.blocks.next_index() {
            let Some(block) = self.blocks.get_mut(index) else {
                bug!("block {index} vanished before pass 2");
            };
            let statements = std::mem::take(&mut block.statements);
            let result = self.encode_block(index, &statements, out);
            if let Some(block) = self.blocks.get_mut(index) {
                block.statements = statements;
            }
            result?;
        }
        Ok(())
    }

    fn encode_block<W: Write>(
        &mut self,
        index: u32,
        statements: &[Statement],
        out: &mut ObjectWriter<W>,
    ) -> Result<(), Error> {
        let Some(block) = self.blocks.get(index) else {
            bug!("block {index} vanished during pass 2");
        };
        if self.current_length != block.addr {
            bug!(
                "block {} starts at {} in pass 2 but {} in pass 1",
                block.name,
                self.current_length,
                block.addr
            );
        }
        let mut handlers = Vec::with_capacity(block.handlers.len());
        for handler in &block.handlers {
            let Some(triple) = handler.triple() else {
                bug!("handler {} of {} unresolved in pass 2", handler.handle, block.name);
            };
            handlers.push(triple);
        }
        let name = block.name.clone();
        // the statements were moved out of the block for pass 2
        let length = block::length_of(statements);
        let mut words = Vec::with_capacity(block.span as usize);
        for stmt in statements {
            words.extend(self.emit(stmt)?);
        }
        tracing::trace!(
            "writing block {} ({} words, {} handlers)",
            name,
            words.len(),
            handlers.len()
        );
        out.block(&EncodedBlock {
            name,
            length,
            words,
            handlers,
        })
    }
}

/// Run both passes over `program` and write the object to `out`. Returns
/// the number of errors; nothing is written unless it is zero.
pub fn assemble<W: Write>(
    program: &Program,
    config: Config,
    reporter: Box<dyn Reporter>,
    out: W,
) -> Result<usize, Error> {
    let mut asm = Assembler::new(config, reporter);
    tracing::trace!("starting pass 1");
    for func in &program.functions {
        let handlers = func
            .handlers
            .iter()
            .map(|h| asm.process_handler(&h.handle, &h.start, &h.end))
            .collect();
        asm.process_function(
            &func.name,
            func.end_label(),
            handlers,
            func.statements.clone(),
        )?;
    }

    let mut out = ObjectWriter::new(out);
    let errors = asm.between_passes(&mut out)?;
    if errors == 0 {
        asm.encode_functions(&mut out)?;
        tracing::debug!("wrote {} bytes", out.written());
    }
    out.flush()?;
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::Silent;
    use xpvm_arch::Operands::*;

    fn asm() -> Assembler {
        Assembler::new(Config::default(), Box::new(Silent))
    }

    fn feed(asm: &mut Assembler, stmts: &[Statement]) -> Vec<u32> {
        stmts
            .iter()
            .flat_map(|s| asm.process_statement(s).expect("no bug"))
            .collect()
    }

    fn errors(asm: &Assembler) -> Vec<UserError> {
        asm.diagnostics()
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.error.clone())
            .collect()
    }

    fn run(stmts: &[Statement]) -> (Assembler, Vec<u32>) {
        let mut asm = asm();
        feed(&mut asm, stmts);
        let mut out = ObjectWriter::new(Vec::new());
        asm.between_passes(&mut out).expect("no bug");
        let words = if asm.state() == State::Pass2 {
            feed(&mut asm, stmts)
        } else {
            vec![]
        };
        (asm, words)
    }

    #[test]
    fn forward_reference() {
        let stmts = [
            Statement::op("jmp", Addr("L".into())),
            Statement::op("halt", Empty),
            Statement::op("halt", Empty),
            Statement::labeled("L", "ret", Empty),
        ];
        let (asm, words) = run(&stmts);
        assert_eq!(asm.error_count(), 0);
        assert_eq!(words, vec![0x0000_2014, 0x00, 0x00, 0x10]);
    }

    #[test]
    fn backward_reference() {
        let stmts = [
            Statement::labeled("top", "halt", Empty),
            Statement::op("beq", RegRegAddr(1, 2, "top".into())),
        ];
        let (_, words) = run(&stmts);
        // delta -2 in the low 16 bits swallows reg2
        assert_eq!(words[1], 0x1301_FFFE);
    }

    #[test]
    fn duplicate_label_keeps_first_address() {
        let mut asm = asm();
        feed(
            &mut asm,
            &[
                Statement::labeled("x", "halt", Empty),
                Statement::labeled("x", "halt", Empty),
            ],
        );
        assert_eq!(errors(&asm), vec![UserError::AlreadyDefined("x".into())]);
        assert_eq!(asm.symbols().find("x").and_then(|s| s.address()), Some(0));
    }

    #[test]
    fn unknown_opcode_and_shape_mismatch() {
        let mut asm = asm();
        feed(
            &mut asm,
            &[
                Statement::op("frob", Empty),
                Statement::op("jmp", Reg(1)),
                Statement::op("jmp", Addr("nowhere".into())),
            ],
        );
        assert_eq!(
            errors(&asm),
            vec![
                UserError::UnknownOpcode("frob".into()),
                UserError::OperandMismatch {
                    op: "jmp".into(),
                    expected: Format::Addr,
                    found: Format::Reg,
                },
            ]
        );
        // bad statements still occupy their word
        assert_eq!(asm.current_length(), 3);
        // the mismatched jmp recorded nothing
        assert_eq!(asm.symbols().len(), 1);
    }

    #[test]
    fn constant_budgets() {
        let mut asm = asm();
        feed(
            &mut asm,
            &[
                Statement::op("ldimm", RegConst(1, 32767)),
                Statement::op("ldimm", RegConst(1, 32768)),
                Statement::op("ldind", RegRegConst(1, 2, -128)),
                Statement::op("stind", RegRegConst(1, 2, 128)),
                Statement::op("word", Const(i32::MAX)),
            ],
        );
        assert_eq!(
            errors(&asm),
            vec![
                UserError::ConstantRange(32768, 16),
                UserError::ConstantRange(128, 8),
            ]
        );
    }

    #[test]
    fn alloc_and_directives_adjust_length() {
        let mut asm = asm();
        feed(
            &mut asm,
            &[
                Statement::op("import", Addr("ext".into())),
                Statement::op("alloc", Const(4)),
                Statement::op("word", Const(1)),
                Statement::op("export", Addr("here".into())),
                Statement::label("here"),
            ],
        );
        assert_eq!(asm.current_length(), 5);
        assert_eq!(asm.symbols().find("here").and_then(|s| s.address()), Some(5));
    }

    #[test]
    fn alloc_zero_has_no_net_footprint() {
        let mut asm = asm();
        feed(&mut asm, &[Statement::op("alloc", Const(0))]);
        assert_eq!(errors(&asm), vec![UserError::NonPositiveAlloc]);
        assert_eq!(asm.current_length(), 0);
    }

    #[test]
    fn alloc_emits_zero_words() {
        let (_, words) = run(&[
            Statement::op("alloc", Const(3)),
            Statement::op("word", Const(0x1234_5678)),
        ]);
        assert_eq!(words, vec![0, 0, 0, 0x1234_5678]);
    }

    #[test]
    fn imported_reference_encodes_zero() {
        let (asm, words) = run(&[
            Statement::op("import", Addr("ext".into())),
            Statement::op("call", Addr("ext".into())),
            Statement::op("load", RegAddr(3, "ext".into())),
        ]);
        assert_eq!(asm.error_count(), 0);
        assert_eq!(words, vec![0x0000_000F, 0x0000_0301]);
    }

    #[test]
    fn undefined_reference_reported_once() {
        let (asm, words) = run(&[
            Statement::op("call", Addr("f".into())),
            Statement::op("jmp", Addr("f".into())),
        ]);
        assert_eq!(errors(&asm), vec![UserError::Undefined("f".into())]);
        assert_eq!(asm.state(), State::BetweenPasses);
        assert!(words.is_empty());
    }

    #[test]
    fn import_export_conflicts() {
        let (asm, _) = run(&[
            Statement::op("import", Addr("both".into())),
            Statement::op("export", Addr("both".into())),
            Statement::op("call", Addr("both".into())),
            Statement::op("import", Addr("unused".into())),
            Statement::op("export", Addr("missing".into())),
            Statement::op("export", Addr("a_very_long_exported_name".into())),
            Statement::label("a_very_long_exported_name"),
        ]);
        assert_eq!(
            errors(&asm),
            vec![
                UserError::ImportedAndExported("both".into()),
                UserError::ExportedNotDefined("both".into()),
                UserError::ImportedNotReferenced("unused".into()),
                UserError::ExportedNotDefined("missing".into()),
                UserError::ExportNameTooLong("a_very_long_exported_name".into()),
            ]
        );
    }

    #[test]
    fn validation_is_repeatable() {
        let mut asm = asm();
        feed(
            &mut asm,
            &[
                Statement::op("jmp", Addr("nowhere".into())),
                Statement::op("import", Addr("x".into())),
                Statement::labeled("x", "halt", Empty),
            ],
        );
        let first = asm.validate();
        assert_eq!(first.len(), 3);
        assert_eq!(asm.validate(), first);
    }

    #[test]
    fn wrong_state_is_a_bug() {
        let mut asm = asm();
        let mut out = ObjectWriter::new(Vec::new());
        assert!(matches!(asm.encode_functions(&mut out), Err(Error::Bug(_))));
        asm.between_passes(&mut out).expect("clean");
        assert!(matches!(asm.between_passes(&mut out), Err(Error::Bug(_))));
        assert!(matches!(
            asm.process_function("f", "f", vec![], vec![]),
            Err(Error::Bug(_))
        ));
    }

    #[test]
    fn function_labels_must_match() {
        let mut asm = asm();
        let index = asm
            .process_function("f", "g", vec![], vec![Statement::op("ret", Empty)])
            .expect("no bug");
        assert_eq!(index, 0);
        assert_eq!(
            errors(&asm),
            vec![UserError::FunctionMismatch {
                start: "f".into(),
                end: "g".into()
            }]
        );
        assert_eq!(asm.symbols().find("f").and_then(|s| s.address()), Some(0));
    }

    #[test]
    fn function_diagnostics_point_at_first_statement() {
        let mut asm = asm();
        let body = |line| vec![Statement::op("ret", Empty).at("lib.s", line)];
        asm.process_function("f", "f", vec![Handler::new("h", "f", "f")], body(3))
            .expect("no bug");
        asm.process_function("f", "f", vec![], body(9)).expect("no bug");
        let mut out = ObjectWriter::new(Vec::new());
        asm.between_passes(&mut out).expect("no bug");

        let found: Vec<_> = asm
            .diagnostics()
            .iter()
            .map(|d| (d.error.clone(), d.loc.as_ref().map(|l| l.line)))
            .collect();
        assert_eq!(
            found,
            vec![
                (UserError::AlreadyDefined("f".into()), Some(9)),
                (
                    UserError::UnresolvedHandler {
                        label: "h".into(),
                        function: "f".into()
                    },
                    Some(3)
                ),
            ]
        );
    }

    #[test]
    fn block_ids_resolve_after_pass_1() {
        let mut asm = asm();
        asm.process_function(
            "main",
            "main",
            vec![],
            vec![Statement::op("ldblkid", RegAddr(2, "later".into()))],
        )
        .expect("no bug");
        asm.process_function("later", "later", vec![], vec![Statement::op("ret", Empty)])
            .expect("no bug");
        assert_eq!(asm.resolve_block_id("later"), Some(1));
        let mut out = ObjectWriter::new(Vec::new());
        assert_eq!(asm.between_passes(&mut out).expect("no bug"), 0);
        assert!(asm.symbols().find("later").is_some_and(|s| !s.referenced));
    }
}
