use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

use crate::analyzer::component_classifier::ComponentInfo;
use crate::analyzer::pattern_detector::PatternFinding;
use crate::architecture::HealthStatus;
use crate::error::{AnalysisError, AnalysisWarning};
use crate::parser::references::DependencyEdge;

const TOP_PATTERN_LIMIT: usize = 5;

/// Everything one run produces. Built once at the end of `analyze`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub error_message: String,
    pub duration_ms: u64,
    pub architecture_label: String,
    pub quality_score: u32,
    pub complexity_level: String,
    pub project_type: String,
    pub files_analyzed: usize,
    pub component_count: usize,
    pub dependency_count: usize,
    pub unresolved_dependency_count: usize,
    pub pattern_count: usize,
    pub components: Vec<ComponentInfo>,
    pub dependencies: Vec<DependencyEdge>,
    pub patterns: Vec<PatternFinding>,
    pub warnings: Vec<AnalysisWarning>,
    pub prompt: String,
}

impl AnalysisResult {
    pub fn failure(error: &AnalysisError, duration_ms: u64) -> Self {
        Self {
            success: false,
            error_message: error.to_string(),
            duration_ms,
            ..Default::default()
        }
    }

    /// Result content with the timing field cleared, for run-to-run comparison.
    pub fn without_timing(&self) -> Self {
        Self {
            duration_ms: 0,
            ..self.clone()
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::from_score(self.quality_score)
    }

    pub fn summary(&self) -> String {
        if !self.success {
            return format!("analysis failed: {}", self.error_message);
        }
        format!(
            "{} files, {} components, {} dependencies ({} unresolved), {} patterns, {} warnings, architecture {}, quality {} ({})",
            self.files_analyzed,
            self.component_count,
            self.dependency_count,
            self.unresolved_dependency_count,
            self.pattern_count,
            self.warnings.len(),
            self.architecture_label,
            self.quality_score,
            self.health(),
        )
    }
}

/// Renders the LLM context prompt. Output depends only on `result` content,
/// never on timing.
pub fn render_prompt(result: &AnalysisResult) -> Result<String, AnalysisError> {
    if !result.success {
        return Err(AnalysisError::InvalidResult(if result.error_message.is_empty() {
            "result is not marked successful".to_string()
        } else {
            result.error_message.clone()
        }));
    }

    let mut prompt = String::new();
    build_prompt(&mut prompt, result)
        .map_err(|e| AnalysisError::Internal(format!("Failed to render prompt: {}", e)))?;
    Ok(prompt)
}

fn build_prompt(out: &mut String, result: &AnalysisResult) -> fmt::Result {
    write_overview(out, result)?;
    write_patterns(out, &result.patterns)?;
    write_components(out, &result.components)
}

fn write_overview(out: &mut String, result: &AnalysisResult) -> fmt::Result {
    writeln!(out, "# Unity Project Context")?;
    writeln!(out)?;
    writeln!(out, "## Project Overview")?;
    writeln!(out, "**Architecture:** {}", result.architecture_label)?;
    writeln!(out, "**Quality Score:** {} ({})", result.quality_score, result.health())?;
    if !result.complexity_level.is_empty() {
        writeln!(out, "**Complexity:** {}", result.complexity_level)?;
    }
    if !result.project_type.is_empty() {
        writeln!(out, "**Type:** {}", result.project_type)?;
    }
    writeln!(out, "**Files Analyzed:** {}", result.files_analyzed)?;
    writeln!(out, "**Components:** {}", result.component_count)?;
    writeln!(
        out,
        "**Dependencies:** {} ({} unresolved)",
        result.dependency_count, result.unresolved_dependency_count
    )?;
    writeln!(out, "**Patterns:** {}", result.pattern_count)?;
    if !result.warnings.is_empty() {
        writeln!(out, "**Warnings:** {}", result.warnings.len())?;
    }
    writeln!(out)
}

fn write_patterns(out: &mut String, patterns: &[PatternFinding]) -> fmt::Result {
    writeln!(out, "## Detected Patterns")?;
    if patterns.is_empty() {
        writeln!(out, "None detected.")?;
        return writeln!(out);
    }

    for (i, finding) in top_patterns(patterns).iter().enumerate() {
        writeln!(
            out,
            "{}. {} ({:.2}): {} - {}",
            i + 1,
            finding.pattern_name,
            finding.confidence,
            finding.components.join(", "),
            finding.description
        )?;
    }
    writeln!(out)
}

fn write_components(out: &mut String, components: &[ComponentInfo]) -> fmt::Result {
    writeln!(out, "## Components")?;
    for component in components_by_complexity(components) {
        let base = component.base_type.as_deref().unwrap_or("none");
        let hooks = if component.lifecycle_hooks.is_empty() {
            "none".to_string()
        } else {
            component.lifecycle_hooks.join(", ")
        };
        write!(
            out,
            "- {} : {} | hooks: {} | deps: {}",
            component.name,
            base,
            hooks,
            component.dependencies.len()
        )?;
        match &component.asset_menu {
            Some(menu) => writeln!(out, " | menu: {}", menu)?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

/// Highest confidence first; ties by pattern name, then components.
pub fn top_patterns(patterns: &[PatternFinding]) -> Vec<&PatternFinding> {
    let mut ranked: Vec<&PatternFinding> = patterns.iter().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.pattern_name.cmp(&b.pattern_name))
            .then_with(|| a.components.cmp(&b.components))
            .then_with(|| a.primary_file.cmp(&b.primary_file))
    });
    ranked.truncate(TOP_PATTERN_LIMIT);
    ranked
}

/// Most complex first; ties by qualified name, then file path.
pub fn components_by_complexity(components: &[ComponentInfo]) -> Vec<&ComponentInfo> {
    let mut ordered: Vec<&ComponentInfo> = components.iter().collect();
    ordered.sort_by(|a, b| {
        b.complexity
            .cmp(&a.complexity)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.file_path.cmp(&b.file_path))
    });
    ordered
}
