pub mod global_index;
pub mod framework_patterns;
pub mod component_classifier;
pub mod pattern_detector;
pub mod workspace_analyzer;

pub use global_index::{
    SymbolIndex,
    IndexStats,
    normalize_type_name,
    element_type_name,
};

pub use framework_patterns::{
    FrameworkPatterns,
    LifecycleHook,
    LifecyclePhase,
};

pub use component_classifier::{
    ComponentClassifier,
    ComponentInfo,
    UnitClassification,
};

pub use pattern_detector::{
    PatternDetector,
    PatternFinding,
};

pub use workspace_analyzer::{
    ProjectAnalyzer,
    ProjectSnapshot,
    analyze,
};
