use crate::models::location::Location;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PendingFile {
    pub location: Location,
    pub file_name: String,
    pub path: PathBuf,
}

impl PendingFile {
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.location.name, self.file_name)
    }
}
