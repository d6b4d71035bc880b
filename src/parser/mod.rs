pub mod csharp_parser;
pub mod symbols;
pub mod references;

pub use csharp_parser::CSharpParser;
pub use symbols::*;
pub use references::{DependencyEdge, DependencyExtractor, DependencyKind};

#[cfg(test)]
mod tests;
