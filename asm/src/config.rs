use std::{fs::File, io::BufReader};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Print every defined label with its address between the passes.
    pub list_labels: bool,
    /// `ldblkid` naming an undeclared block loads block 0 with a warning
    /// instead of failing.
    pub block_id_fallback: bool,
    /// Colored diagnostics.
    pub color: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::FileOpen(path.to_string(), e))?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(Error::Config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        serde_yaml::from_str(text).map_err(Error::Config)
    }
}
