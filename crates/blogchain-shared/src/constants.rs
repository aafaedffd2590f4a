/// Bech32 human-readable prefix for account addresses
pub const ADDRESS_PREFIX: &str = "blogchain";

/// Deepest nesting level a comment may sit at (root comments are depth 0)
pub const MAX_COMMENT_DEPTH: u32 = 5;

/// `parent_id` value that marks a top-level comment
pub const ROOT_PARENT_ID: u64 = 0;

/// First ID handed out by every entity sequence. ID 0 is never assigned.
pub const SEQUENCE_START: u64 = 1;

/// Sequence names
pub const POST_SEQUENCE: &str = "post_count";
pub const COMMENT_SEQUENCE: &str = "comment_count";

/// Comment content limit in bytes
pub const MAX_COMMENT_LENGTH: usize = 5000;

/// Profile field limits in bytes
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 20;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 50;
pub const MAX_BIO_LENGTH: usize = 500;
pub const MAX_AVATAR_URL_LENGTH: usize = 500;
pub const MAX_WEBSITE_LENGTH: usize = 200;

/// Pagination limits
pub const DEFAULT_PAGE_LIMIT: u64 = 50;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Thread depth used by the query surface when the caller gives none
pub const DEFAULT_THREAD_DEPTH: u32 = 10;

/// Default HTTP gateway port (server)
pub const DEFAULT_HTTP_PORT: u16 = 1317;
