pub mod configuration;
pub mod logging;
pub mod pipeline;
pub mod versions;
