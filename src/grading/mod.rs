//! Grading engine
//!
//! Wraps submitted code in a per-language harness and executes it against
//! question test cases on a Judge0 instance, turning execution results into
//! per-case verdicts.

mod judge0;
mod languages;

pub use judge0::Judge0Client;
pub use languages::{find_language, supported_languages, LanguageConfig, LANGUAGES};
