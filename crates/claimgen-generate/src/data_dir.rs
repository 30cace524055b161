use std::path::{Path, PathBuf};

use crate::errors::GenerationError;

/// Resolved storage layout of one generated data set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDirectory {
    pub dir: PathBuf,
    pub claims: PathBuf,
    pub documents: PathBuf,
    pub employers: PathBuf,
    pub employees: PathBuf,
    pub used_employees: PathBuf,
}

impl DataDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let claims = dir.join("claims.ndjson");
        let documents = dir.join("documents");
        let employers = dir.join("employers.ndjson");
        let employees = dir.join("employees.ndjson");
        let used_employees = dir.join("used_employees.ndjson");
        Self {
            dir,
            claims,
            documents,
            employers,
            employees,
            used_employees,
        }
    }

    /// Create the directory tree.
    pub fn prepare(&self) -> Result<(), GenerationError> {
        create_if_missing(&self.dir)?;
        create_if_missing(&self.documents)?;
        Ok(())
    }
}

fn create_if_missing(path: &Path) -> Result<(), GenerationError> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(GenerationError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_creates_the_documents_directory() {
        let root = std::env::temp_dir().join(format!("claimgen_data_{}", uuid::Uuid::new_v4()));
        let data = DataDirectory::new(&root);
        assert_eq!(data.claims, root.join("claims.ndjson"));
        data.prepare().unwrap();
        data.prepare().unwrap();
        assert!(data.documents.is_dir());
        let _ = std::fs::remove_dir_all(root);
    }
}
