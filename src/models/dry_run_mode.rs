/// Defines the dry-run behavior mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRunMode {
    /// Normal operation - execute every pending file
    None,

    /// Quick preview - list pending files without opening any database
    Quick,

    /// Full simulation - execute every file inside a transaction that is
    /// always rolled back, so rejected statements surface without changes
    Full,
}

impl DryRunMode {
    /// Returns true if this is any dry-run mode (Quick or Full)
    pub fn is_dry_run(&self) -> bool {
        matches!(self, DryRunMode::Quick | DryRunMode::Full)
    }

    /// Returns true if files should be run against a database at all
    pub fn should_execute(&self) -> bool {
        !matches!(self, DryRunMode::Quick)
    }

    /// Returns true if executed statements should be kept
    pub fn should_commit(&self) -> bool {
        matches!(self, DryRunMode::None)
    }

    /// Get display string for progress bars
    pub fn progress_prefix(&self) -> &'static str {
        match self {
            DryRunMode::None => "",
            DryRunMode::Quick => "[DRY RUN - QUICK] ",
            DryRunMode::Full => "[DRY RUN - FULL] ",
        }
    }
}
