use std::env;

use lazy_static::lazy_static;

/// Class name of the interval objects being verified, unless configured otherwise
pub const DEFAULT_INTERVAL_CLASS: &str = "Interval";

/// Name of the method that queries an interval object at a given time
pub const DEFAULT_QUERY_METHOD: &str = "query";

/// Name that the IR gives to object constructors
pub const CONSTRUCTOR_NAME: &str = "<init>";

// common configurations
lazy_static! {
    pub static ref PARALLEL: bool = matches!(env::var("TIMEGUARD_PARALLEL"), Ok(val) if val == "1");
    pub static ref INTERVAL_CLASS: String =
        env::var("TIMEGUARD_INTERVAL_CLASS").unwrap_or_else(|_| DEFAULT_INTERVAL_CLASS.to_string());
    pub static ref QUERY_METHOD: String =
        env::var("TIMEGUARD_QUERY_METHOD").unwrap_or_else(|_| DEFAULT_QUERY_METHOD.to_string());
}
