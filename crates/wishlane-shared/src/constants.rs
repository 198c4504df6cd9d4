/// Application name
pub const APP_NAME: &str = "WishLane";

/// Owner identity used when no user is signed in (demo mode)
pub const DEMO_OWNER_ID: &str = "demo-user";

/// Per-owner collection names
pub const GIFTS_COLLECTION: &str = "gifts";
pub const EVENTS_COLLECTION: &str = "events";

/// Object storage prefix for profile pictures
pub const AVATAR_PREFIX: &str = "avatars";

/// Maximum image upload size in bytes (10 MiB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Upper bound (exclusive) for the number in "Gift N" / "Event N" samples
pub const SAMPLE_NUMBER_RANGE: u32 = 1000;

/// Default capacity of the store's change feed
pub const DEFAULT_CHANGE_FEED_CAPACITY: usize = 256;
