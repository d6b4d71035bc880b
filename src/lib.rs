pub mod config;
pub mod error;
pub mod workspace;
pub mod parser;
pub mod analyzer;
pub mod architecture;
pub mod report;

pub use config::AnalysisOptions;
pub use error::{AnalysisError, AnalysisWarning, WarningKind};
pub use workspace::{SourceDiscovery, SourceFilter, SourceFile};
pub use parser::{CSharpParser, ParsedFile, SourceUnit, DependencyEdge, DependencyKind};
pub use analyzer::{analyze, ProjectAnalyzer, ComponentInfo, PatternFinding, SymbolIndex, FrameworkPatterns};
pub use architecture::{ArchitectureScorer, ArchitectureAssessment};
pub use report::{render_prompt, AnalysisResult};
