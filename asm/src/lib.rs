//! Code generation backend of the xpvm assembler.
//!
//! Takes parsed statements grouped into functions, resolves labels in two
//! passes and writes the object file.

pub mod assembler;
pub mod block;
pub mod config;
pub mod error;
pub mod msg;
pub mod object;
pub mod program;
pub mod stmt;
pub mod symtab;
pub mod util;

pub use assembler::{assemble, Assembler, State};
pub use block::{Block, Blocks, Handler};
pub use config::Config;
pub use error::{Error, UserError};
pub use msg::{Console, Diagnostic, Reporter, Severity, Silent};
pub use object::{EncodedBlock, ObjectWriter};
pub use program::{FunctionDecl, Program};
pub use stmt::{Location, Statement};
pub use symtab::{Reference, Symbol, SymbolId, SymbolTable};
