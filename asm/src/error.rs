use thiserror::Error;
use xpvm_arch::Format;

/// Problems in the assembled program. They are reported and counted, and
/// assembly keeps going so that one run surfaces as many as possible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("label {0} already defined")]
    AlreadyDefined(String),

    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),

    #[error("opcode {op} does not match the given operands (expects {expected}, got {found})")]
    OperandMismatch {
        op: String,
        expected: Format,
        found: Format,
    },

    #[error("constant must be greater than zero")]
    NonPositiveAlloc,

    #[error("constant {0} will not fit in {1} bits")]
    ConstantRange(i32, u8),

    #[error("symbol {0} exported more than once")]
    ExportedTwice(String),

    #[error("symbol {0} imported more than once")]
    ImportedTwice(String),

    #[error("program consumes more than 2^20 words ({0} words)")]
    ProgramTooLarge(u32),

    #[error("label {0} is referenced but not defined or imported")]
    Undefined(String),

    #[error("reference to label {symbol} at address {addr} won't fit in {bits} bits")]
    AddressRange { symbol: String, addr: u32, bits: u8 },

    #[error("symbol {0} is both imported and exported")]
    ImportedAndExported(String),

    #[error("symbol {0} is both imported and defined")]
    ImportedAndDefined(String),

    #[error("symbol {0} is imported but not referenced")]
    ImportedNotReferenced(String),

    #[error("symbol {0} is exported but not defined")]
    ExportedNotDefined(String),

    #[error("symbol {0} is imported and longer than 16 characters")]
    ImportNameTooLong(String),

    #[error("symbol {0} is exported and longer than 16 characters")]
    ExportNameTooLong(String),

    #[error("function start label {start} does not match end label {end}")]
    FunctionMismatch { start: String, end: String },

    #[error("handler label {label} of function {function} is not defined")]
    UnresolvedHandler { label: String, function: String },

    #[error("block {0} named by ldblkid is not declared")]
    UnknownBlock(String),
}

/// Conditions that end the run: a defect in the assembler or its caller,
/// or an unusable environment.
#[derive(Error, Debug)]
pub enum Error {
    #[error("internal error: {0}")]
    Bug(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config: {0}")]
    Config(#[source] serde_yaml::Error),

    #[error("Failed to read program: {0}")]
    Program(#[source] serde_yaml::Error),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to create file: {0}")]
    FileCreate(String, #[source] std::io::Error),
}

/// Shorthand for raising [`Error::Bug`].
macro_rules! bug {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Bug(format!($($arg)*)))
    };
}

pub(crate) use bug;
