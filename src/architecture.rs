use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::component_classifier::ComponentInfo;
use crate::analyzer::pattern_detector::{PatternFinding, PUBLISH_SUBSCRIBE, SINGLETON, STATE_MACHINE};
use crate::error::{AnalysisWarning, WarningKind};
use crate::parser::references::DependencyEdge;

pub const EVENT_DRIVEN: &str = "event-driven";
pub const SINGLETON_BASED: &str = "singleton-based";
pub const STATE_MACHINE_BASED: &str = "state-machine";
pub const COMPONENT_BASED: &str = "component-based";

const COMPLEX_UNIT_THRESHOLD: u32 = 20;
const COMPLEX_UNIT_PENALTY: u32 = 5;
const UNRESOLVED_ALLOWANCE: usize = 5;
const UNRESOLVED_PENALTY: u32 = 10;
const COLLISION_PENALTY: u32 = 5;

/// Project-wide label, health score and descriptive metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureAssessment {
    pub architecture_label: String,
    pub quality_score: u32,
    pub penalties: QualityPenalties,
    pub complexity_level: String,
    pub project_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityPenalties {
    pub complex_units: usize,
    pub unresolved_dependencies: usize,
    pub name_collisions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Critical => write!(f, "critical"),
        }
    }
}

impl HealthStatus {
    pub fn from_score(quality_score: u32) -> Self {
        match quality_score {
            80..=u32::MAX => HealthStatus::Healthy,
            50..=79 => HealthStatus::Warning,
            _ => HealthStatus::Critical,
        }
    }
}

pub struct ArchitectureScorer;

impl ArchitectureScorer {
    pub fn assess(
        components: &[ComponentInfo],
        edges: &[DependencyEdge],
        findings: &[PatternFinding],
        warnings: &[AnalysisWarning],
        generate_metadata: bool,
    ) -> ArchitectureAssessment {
        let penalties = QualityPenalties {
            complex_units: components
                .iter()
                .filter(|c| c.complexity > COMPLEX_UNIT_THRESHOLD)
                .count(),
            unresolved_dependencies: edges.iter().filter(|e| !e.resolved).count(),
            name_collisions: warnings
                .iter()
                .filter(|w| w.kind == WarningKind::NameCollision)
                .count(),
        };

        let (complexity_level, project_type) = if generate_metadata {
            (complexity_level(components), project_type(components))
        } else {
            (String::new(), String::new())
        };

        ArchitectureAssessment {
            architecture_label: architecture_label(findings).to_string(),
            quality_score: quality_score(&penalties),
            penalties,
            complexity_level,
            project_type,
        }
    }
}

/// Precedence: event-driven, singleton-based, state-machine, component-based.
pub fn architecture_label(findings: &[PatternFinding]) -> &'static str {
    let has = |name: &str| findings.iter().any(|f| f.pattern_name == name);
    if has(PUBLISH_SUBSCRIBE) {
        EVENT_DRIVEN
    } else if has(SINGLETON) {
        SINGLETON_BASED
    } else if has(STATE_MACHINE) {
        STATE_MACHINE_BASED
    } else {
        COMPONENT_BASED
    }
}

pub fn quality_score(penalties: &QualityPenalties) -> u32 {
    let unresolved_over = penalties.unresolved_dependencies.saturating_sub(UNRESOLVED_ALLOWANCE);
    let deduction = COMPLEX_UNIT_PENALTY as u64 * penalties.complex_units as u64
        + UNRESOLVED_PENALTY as u64 * unresolved_over as u64
        + COLLISION_PENALTY as u64 * penalties.name_collisions as u64;
    100u64.saturating_sub(deduction) as u32
}

pub fn complexity_level(components: &[ComponentInfo]) -> String {
    if components.is_empty() {
        return "Simple".to_string();
    }
    let total: u64 = components.iter().map(|c| c.complexity as u64).sum();
    let average = total as f64 / components.len() as f64;

    let level = if average < 10.0 {
        "Simple"
    } else if average < 25.0 {
        "Moderate"
    } else if average < 50.0 {
        "Complex"
    } else {
        "Very Complex"
    };
    level.to_string()
}

const PROJECT_TYPES: &[(&str, &[&str])] = &[
    ("Platformer", &["platformer", "jump"]),
    ("First-Person Shooter", &["fps", "shooter"]),
    ("RPG", &["rpg", "inventory"]),
    ("Puzzle", &["puzzle"]),
    ("Racing", &["racing", "car"]),
    ("Strategy", &["strategy", "rts"]),
];

/// Genre vote over component names; each component votes for its first match.
pub fn project_type(components: &[ComponentInfo]) -> String {
    let mut votes = vec![0usize; PROJECT_TYPES.len()];
    for component in components {
        let simple = component.name.rsplit('.').next().unwrap_or(&component.name).to_lowercase();
        if let Some(idx) = PROJECT_TYPES
            .iter()
            .position(|(_, keywords)| keywords.iter().any(|k| simple.contains(k)))
        {
            votes[idx] += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (idx, &count) in votes.iter().enumerate() {
        if count > 0 && best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((idx, count));
        }
    }
    best.map(|(idx, _)| PROJECT_TYPES[idx].0)
        .unwrap_or("Generic Game")
        .to_string()
}
