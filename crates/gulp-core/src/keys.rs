//! Well-known keys in assembly and component inputs/outputs.

pub const SSHKEY: &str = "sshkey";
pub const PASSWORD: &str = "root_password";
pub const USERNAME: &str = "root_username";
pub const DOMAIN: &str = "domain";
pub const PROVIDER: &str = "provider";
pub const PUBLIC_IPV4: &str = "publicipv4";
pub const IMAGE_VERSION: &str = "version";
pub const CPU: &str = "cpu";
pub const RAM: &str = "ram";
pub const HDD: &str = "hdd";

/// Inputs upserted on every status change.
pub const STATUS: &str = "status";
pub const LAST_SUCCESS_STATUS_UPDATE: &str = "lastsuccessstatusupdate";

/// Event metadata keys.
pub const ASSEMBLY_ID: &str = "assembly_id";
pub const ACCOUNT_ID: &str = "account_id";
pub const EVENT_TYPE: &str = "event_type";

/// Operation type carrying repository-hook properties on a component.
pub const CI_OPERATION: &str = "ci";
pub const CI_ENABLED: &str = "enabled";
pub const CI_TOKEN: &str = "token";
pub const CI_USER: &str = "username";

/// Default HDD size (GB) when an assembly carries none.
pub const DEFAULT_HDD: &str = "10";
