//! Field names and fixed values the stage reads or writes

/// Default field holding a record's category
pub const DEFAULT_CATEGORY_FIELD: &str = "SplitCategory";

/// Category assumed for records with a missing or empty category
pub const DEFAULT_CATEGORY: &str = "general";

/// Configured category value that admits every record
pub const ALL_CATEGORIES: &str = "all";

/// Default field holding a record's ISO country code
pub const DEFAULT_COUNTRY_FIELD: &str = "cc";

pub const NAME: &str = "name";
pub const NAME_TYPE: &str = "name_type";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";
pub const GEO: &str = "geo";
pub const SEARCH_ONLY: &str = "search_only";
pub const SCRIPT: &str = "script";
pub const NAME_ARABIC: &str = "name_ar";
pub const NAME_CJK: &str = "name_cjk";
pub const FEAT_CLASS: &str = "feat_class";

/// Feature classes exempt from the short-alphanumeric flag: administrative
/// areas and populated places
pub const EXEMPT_FEAT_CLASSES: &[&str] = &["A", "P"];

/// Column read from CSV stop-term files
pub const STOP_TERM_COLUMN: &str = "exclusion";

/// Value written to `search_only` when a name is unfit for tagging
pub const FLAG_TRUE: &str = "true";

/// Default minimum acceptable name length, in characters
pub const DEFAULT_SHORT_NAME_THRESHOLD: usize = 2;

/// Longest name, in characters, checked by the short-alphanumeric flag
pub const DEFAULT_SHORT_ALPHANUMERIC_LENGTH: usize = 8;

/// Names shorter than this also have their diacritics folded before the
/// stop-term lookup
pub const DIACRITIC_FOLD_MAX_CHARS: usize = 15;

/// Rows between progress log lines
pub const PROGRESS_INTERVAL: u64 = 100_000;
