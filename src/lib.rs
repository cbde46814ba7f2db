//! LAS Processor Library
//!
//! A Rust library for reading Log ASCII Standard (LAS) well-log files in
//! versions 1.2, 2.0 and 3.0.
//!
//! This library provides tools for:
//! - Resolving the file's version, wrap mode and data delimiter
//! - Splitting documents into named sections per the version's grammar
//! - Parsing delimiter-ordered header lines and numeric data matrices
//! - Reconciling curve definitions with data columns (congruency)
//! - Two-tier error recording with partial-failure recovery: a damaged
//!   section never prevents the rest of the file from being read

pub mod config;
pub mod constants;
pub mod error;

// Core application modules
pub mod app {
    pub mod identifier;
    pub mod models;
    pub mod services {
        pub mod congruency;
        pub mod data_parser;
        pub mod document;
        pub mod header_parser;
        pub mod section_splitter;
        pub mod validator;
        pub mod version_resolver;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export the primary reading surface
pub use app::models::{
    DataMatrix, DelimiterKind, ErrorRecord, HeaderField, LasDocument, Section, SectionKind,
    Severity, Stage, Version, VersionInfo,
};
pub use app::services::document::{
    ReadOptions, error_check, parse_str, parse_str_with_options, read, read_with_options,
    read_with_table,
};
pub use error::{LasError, Result};
