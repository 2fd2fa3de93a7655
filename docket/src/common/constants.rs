// record constants
pub const RECORD_ID: &str = "id";

// store constants
pub const META_BUCKET_NAME: &str = "$docket_meta";
pub const META_KEY: &str = "database";
pub const FORMAT_VERSION: u32 = 1;

// key constants
pub const RECORD_KEY_WIDTH: usize = 8;
pub const VALUE_TAG_WIDTH: usize = 4;
