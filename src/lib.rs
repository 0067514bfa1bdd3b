pub mod script;

/// Log filter used by the `brine_respack` binary.
pub const DEFAULT_LOG_FILTER: &str = "info,brine_resource_pack=debug,brine_respack=debug";
