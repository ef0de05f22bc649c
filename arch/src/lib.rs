//! Machine definition of the xpvm: instruction formats, the opcode table and
//! the 32-bit word encoder.

pub mod format;
pub mod inst;
pub mod op;
pub mod reg;
pub mod word;

pub use format::{fits_in_bits, pc_relative, Format};
pub use inst::{Instruction, Mnemonic, Operands};
pub use op::{encoding_of, verify_opcode, Opcode, DIRECTIVE};
pub use reg::Reg;
pub use word::{encode, Fields};
