/// Account type assigned to accounts synthesized during ingestion
pub const DEFAULT_ACCOUNT_TYPE: &str = account_types::OTHER;

/// Account type constants
pub mod account_types {
    pub const BANK: &str = "bank";
    pub const BROKERAGE: &str = "brokerage";
    pub const PENSION: &str = "pension";
    pub const CARD: &str = "card";
    pub const OTHER: &str = "other";
}

/// Returns true if the given account type is valid.
pub fn is_valid_account_type(account_type: &str) -> bool {
    matches!(
        account_type,
        account_types::BANK
            | account_types::BROKERAGE
            | account_types::PENSION
            | account_types::CARD
            | account_types::OTHER
    )
}
