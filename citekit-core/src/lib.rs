//! Citekit Core - Citekey-driven research note management
//!
//! This library provides the core functionality for extracting, validating,
//! and indexing citekeys across a collection of outline-format note files,
//! resolving the study files associated with a citekey, and building web
//! search queries from a citekey's parts. All user interaction (prompting,
//! opening files, displaying results) is left to the caller.

pub mod citekey;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod resolve;
pub mod search;

pub use citekey::{Citekey, CitekeyFormat};
pub use config::Config;
pub use document::{load_documents, Document, Heading, Span};
pub use error::CitekitError;
pub use index::{CitekeyIndex, OrphanReport};
pub use resolve::RenameDecision;

/// Result type alias for citekit operations
pub type Result<T> = std::result::Result<T, CitekitError>;
