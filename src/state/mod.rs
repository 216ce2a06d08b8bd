/// State management module
///
/// This module handles everything that lives in the catalog, including:
/// - Database connections and queries (library.rs)
/// - Shared data structures (data.rs)
/// - Reading and writing stored image lists (image_list.rs)

pub mod data;
pub mod image_list;
pub mod library;
