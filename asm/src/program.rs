use std::{fs::File, io::BufReader};

use serde::{Deserialize, Serialize};

use crate::{block::Handler, error::Error, stmt::Statement};

/// A function as the parser hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    /// Label closing the function; the same as `name` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handlers: Vec<Handler>,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl FunctionDecl {
    pub fn new(name: &str, statements: Vec<Statement>) -> Self {
        FunctionDecl {
            name: name.to_string(),
            end: None,
            handlers: vec![],
            statements,
        }
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn end_label(&self) -> &str {
        self.end.as_deref().unwrap_or(&self.name)
    }
}

/// Parsed program, stored as YAML between the front end and this backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
}

impl Program {
    pub fn load(path: &str) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::FileOpen(path.to_string(), e))?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(Error::Program)
    }

    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        serde_yaml::from_str(text).map_err(Error::Program)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self).map_err(Error::Program)
    }
}
