pub mod error;
pub mod platform_extractor;
pub mod platforms;
pub mod quality;
pub mod utils;
