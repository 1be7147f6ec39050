/// Currency assigned to accounts and instruments synthesized during ingestion
pub const DEFAULT_ENTITY_CURRENCY: &str = "KRW";

/// Asset class assigned to instruments synthesized during ingestion
pub const DEFAULT_ASSET_CLASS: &str = "other";

/// Default page size for snapshot listings
pub const DEFAULT_SNAPSHOT_PAGE_SIZE: u32 = 50;

/// Upper bound for snapshot listing page size
pub const MAX_SNAPSHOT_PAGE_SIZE: u32 = 200;

/// Length of an ISO 4217 currency code
pub const CURRENCY_CODE_LEN: usize = 3;
