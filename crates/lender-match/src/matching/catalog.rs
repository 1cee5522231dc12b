use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::domain::{Program, ProgramId};

/// Failure while loading a JSON program catalog.
#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
    DuplicateProgram(ProgramId),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "failed to read program catalog: {}", err),
            CatalogError::Json(err) => write!(f, "invalid program catalog JSON: {}", err),
            CatalogError::DuplicateProgram(id) => {
                write!(f, "program catalog lists program {} more than once", id)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Json(err) => Some(err),
            CatalogError::DuplicateProgram(_) => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Loader for program definitions exported as a JSON array.
pub struct ProgramCatalogFile;

impl ProgramCatalogFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<Program>, CatalogError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Program>, CatalogError> {
        let programs: Vec<Program> = serde_json::from_reader(reader)?;

        let mut seen = HashSet::new();
        for program in &programs {
            if !seen.insert(program.id) {
                return Err(CatalogError::DuplicateProgram(program.id));
            }
        }

        Ok(programs)
    }
}
