pub mod compact;
pub mod create_config;
pub mod dry_run;
pub mod hooks;
pub mod validate_config;
pub mod version;
