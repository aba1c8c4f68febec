/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// CATEGORY CONSTANTS
// =============================================================================

/// Maximum length of a category name, in characters
pub const CATEGORY_NAME_MAX_LENGTH: u64 = 255;

/// Separator between ancestor names in a category's full path
pub const CATEGORY_PATH_SEPARATOR: &str = " > ";

/// Label of the "no parent" entry in hierarchy options
pub const NO_PARENT_LABEL: &str = "— No Parent —";
