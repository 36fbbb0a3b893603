use std::path::PathBuf;

/// A named backup source. The name doubles as the target database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub directory: PathBuf,
}

impl Location {
    pub fn new(name: &str, directory: &str) -> Self {
        Location {
            name: name.to_string(),
            directory: PathBuf::from(directory),
        }
    }
}
