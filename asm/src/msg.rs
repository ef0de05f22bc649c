use color_print::ceprintln;

use crate::{error::UserError, stmt::Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warn,
}

/// One reported problem, with the statement it was found on when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: UserError,
    pub loc: Option<Location>,
    /// Rendered statement the problem was found on.
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn error(error: UserError) -> Self {
        Diagnostic {
            severity: Severity::Error,
            error,
            loc: None,
            context: None,
        }
    }

    pub fn warn(error: UserError) -> Self {
        Diagnostic {
            severity: Severity::Warn,
            ..Diagnostic::error(error)
        }
    }

    pub fn at(mut self, loc: Option<&Location>, context: Option<String>) -> Self {
        self.loc = loc.cloned();
        self.context = context;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Print with the `error: ... --> file:line` layout.
    pub fn print(&self, color: bool) {
        if !color {
            let kind = match self.severity {
                Severity::Error => "error",
                Severity::Warn => "warn",
            };
            eprintln!("{}: {}", kind, self.error);
            if let Some(loc) = &self.loc {
                eprintln!("     --> {}", loc);
            }
            if let Some(context) = &self.context {
                let line = self.loc.as_ref().map_or(0, |l| l.line);
                eprintln!("      |");
                eprintln!(" {:>4} | {}", line, context);
                eprintln!("      |");
            }
            return;
        }
        match self.severity {
            Severity::Error => ceprintln!("<red,bold>error</>: {}", self.error),
            Severity::Warn => ceprintln!("<yellow,bold>warn</>: {}", self.error),
        }
        if let Some(loc) = &self.loc {
            ceprintln!("     <blue>--></> <underline>{}</>", loc);
        }
        if let Some(context) = &self.context {
            let line = self.loc.as_ref().map_or(0, |l| l.line);
            ceprintln!("      <blue>|</>");
            ceprintln!(" <blue>{:>4} |</> {}", line, context);
            ceprintln!("      <blue>|</>");
        }
    }
}

/// Sink the assembler hands every diagnostic to.
pub trait Reporter {
    fn report(&mut self, diag: &Diagnostic);
}

/// Prints diagnostics to stderr as they arrive.
#[derive(Debug, Default)]
pub struct Console {
    pub color: bool,
}

impl Console {
    pub fn new(color: bool) -> Self {
        Console { color }
    }
}

impl Reporter for Console {
    fn report(&mut self, diag: &Diagnostic) {
        diag.print(self.color);
    }
}

/// Drops diagnostics; the assembler still keeps its own copy.
#[derive(Debug, Default)]
pub struct Silent;

impl Reporter for Silent {
    fn report(&mut self, _diag: &Diagnostic) {}
}
