/// Image assets on disk
///
/// This module handles:
/// - Scanning upload directories into an inventory (scanner.rs)
/// - Copying staged files into the serving directory (staging.rs)

pub mod scanner;
pub mod staging;
