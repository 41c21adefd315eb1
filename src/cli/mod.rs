//! Command-line parsing: input paths, column roles, and match-config overrides.

mod clap_parser;

pub use clap_parser::{Cli, ModeOpt, PolicyOpt, SimilarityOpt, parse_weights};
