/// Separator between the segments of a fully-qualified trait path.
pub const PATH_SEPARATOR: &str = "::";
/// Name of the directory, relative to the output directory, holding all data units.
pub const IMPLEMENTORS_DIR_NAME: &str = "implementors";
/// Prefix of every data unit file stem, followed by the trait name.
pub const UNIT_FILE_PREFIX: &str = "trait.";
pub const UNIT_FILE_EXTENSION: &str = "js";
