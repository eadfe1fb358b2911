// Parsing utilities
pub mod ips;
pub mod kv;
pub mod stringlist;

// Re-export all utilities for convenient access
pub use ips::parse_ips;
pub use kv::parse_kv_params;
pub use stringlist::stringlist_to_dictionary;
