use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzer::framework_patterns::{FrameworkPatterns, LifecyclePhase};
use crate::config::AnalysisOptions;
use crate::parser::csharp_parser::attribute_name;
use crate::parser::symbols::{MemberKind, MethodKind, SourceUnit};

const LOOKUP_PREFIXES: &[&str] = &["Get", "Find", "Lookup", "TryGet"];

/// Structural summary of one unit, produced before dependency extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitClassification {
    pub lifecycle_hooks: Vec<String>,
    pub custom_methods: Vec<String>,
    pub exposed_fields: Vec<String>,
    pub branch_count: u32,
    pub complexity: u32,
    pub purpose: String,
    /// Menu path from `[CreateAssetMenu]`, for asset types that declare one.
    pub asset_menu: Option<String>,
}

/// Exported view of a unit. Built once per unit after dependency extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    pub namespace: String,
    pub file_path: String,
    pub base_type: Option<String>,
    pub purpose: String,
    pub lifecycle_hooks: Vec<String>,
    pub custom_methods: Vec<String>,
    pub exposed_fields: Vec<String>,
    pub fields: Vec<String>,
    pub events: Vec<String>,
    pub dependencies: Vec<String>,
    pub complexity: u32,
    #[serde(default)]
    pub asset_menu: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
}

impl ComponentInfo {
    pub fn assemble(unit: &SourceUnit, classification: UnitClassification, mut dependencies: Vec<String>) -> Self {
        dependencies.sort();
        dependencies.dedup();

        Self {
            name: unit.qualified_name.clone(),
            namespace: unit.namespace.clone(),
            file_path: unit.file_path.clone(),
            base_type: unit.base_type.clone(),
            purpose: classification.purpose,
            lifecycle_hooks: classification.lifecycle_hooks,
            custom_methods: classification.custom_methods,
            exposed_fields: classification.exposed_fields,
            fields: unit.fields().map(|m| m.name.clone()).collect(),
            events: unit.event_like_members().map(|m| m.name.clone()).collect(),
            dependencies,
            complexity: classification.complexity,
            asset_menu: classification.asset_menu,
            line_start: unit.line_start,
            line_end: unit.line_end,
        }
    }
}

pub struct ComponentClassifier<'a> {
    patterns: &'a FrameworkPatterns,
    branch_re: Regex,
    menu_re: Regex,
}

impl<'a> ComponentClassifier<'a> {
    pub fn new(patterns: &'a FrameworkPatterns) -> Result<Self> {
        Ok(Self {
            patterns,
            branch_re: Regex::new(r"\b(?:if|switch|case|for|foreach|while|do)\b")
                .context("Failed to compile branch keyword pattern")?,
            menu_re: Regex::new(r#"\bmenuName\s*=\s*"([^"]*)""#)
                .context("Failed to compile asset menu pattern")?,
        })
    }

    pub fn classify(&self, unit: &SourceUnit, options: &AnalysisOptions) -> UnitClassification {
        let mut hooks: Vec<&str> = Vec::new();
        let mut custom_methods: Vec<String> = Vec::new();

        for method in &unit.methods {
            match method.kind {
                MethodKind::Accessor => {}
                MethodKind::Method if self.patterns.is_lifecycle_hook(&method.name) => {
                    if !hooks.contains(&method.name.as_str()) {
                        hooks.push(&method.name);
                    }
                }
                MethodKind::Method | MethodKind::Constructor => {
                    if !custom_methods.contains(&method.name) {
                        custom_methods.push(method.name.clone());
                    }
                }
            }
        }
        hooks.sort_by(|a, b| {
            self.patterns
                .execution_order(a)
                .cmp(&self.patterns.execution_order(b))
                .then_with(|| a.cmp(b))
        });

        let exposed_fields: Vec<String> = unit
            .members
            .iter()
            .filter(|m| m.is_exposed && m.kind == MemberKind::Field)
            .map(|m| m.name.clone())
            .collect();

        let branch_count: u32 = unit
            .methods
            .iter()
            .map(|m| self.branch_re.find_iter(&m.masked_body).count() as u32)
            .sum();

        let complexity = custom_methods.len() as u32 + 2 * branch_count + exposed_fields.len() as u32;

        let physics = hooks
            .iter()
            .any(|h| self.patterns.phase(h) == Some(LifecyclePhase::Physics));
        let purpose = if options.generate_metadata {
            infer_purpose(unit, &hooks, physics)
        } else {
            String::new()
        };

        UnitClassification {
            lifecycle_hooks: if options.analyze_lifecycle_methods {
                hooks.iter().map(|h| h.to_string()).collect()
            } else {
                Vec::new()
            },
            custom_methods,
            exposed_fields,
            branch_count,
            complexity,
            purpose,
            asset_menu: self.asset_menu(unit),
        }
    }

    /// `[CreateAssetMenu(menuName = "...")]`; without a menu name the
    /// editor files the asset under the class name.
    fn asset_menu(&self, unit: &SourceUnit) -> Option<String> {
        let attribute = unit
            .attributes
            .iter()
            .find(|a| attribute_name(a) == "CreateAssetMenu")?;
        let menu = self
            .menu_re
            .captures(attribute)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
        Some(menu.unwrap_or_else(|| unit.name.clone()))
    }
}

fn infer_purpose(unit: &SourceUnit, hooks: &[&str], physics: bool) -> String {
    let name = unit.name.as_str();
    let has = |keyword: &str| name.contains(keyword);

    if base_simple_name(unit.base_type.as_deref()) == "ScriptableObject" {
        return asset_purpose(unit).to_string();
    }

    let by_name = if has("Player") && has("Controller") {
        Some("Handles player movement, input, and interactions")
    } else if has("Player") && has("Health") {
        Some("Manages player health and damage systems")
    } else if has("Player") {
        Some("Manages player-related functionality")
    } else if has("Enemy") {
        Some("Controls enemy behavior, AI, and interactions")
    } else if has("Camera") {
        Some("Controls camera movement and behavior")
    } else if has("UI") || has("Hud") || has("Menu") {
        Some("Manages user interface elements and interactions")
    } else if has("Spawner") {
        Some("Spawns and tracks object instances")
    } else if has("Audio") || has("Sound") {
        Some("Controls audio playback")
    } else if has("Manager") {
        Some("Manages game systems and coordinates functionality")
    } else if has("Controller") {
        Some("Controls object behavior and state management")
    } else {
        None
    };
    if let Some(purpose) = by_name {
        return purpose.to_string();
    }

    let hook = |h: &str| hooks.contains(&h);
    let by_hooks = if hook("FixedUpdate") && hook("Update") {
        Some("Handles object movement and physics-based interactions")
    } else if physics {
        Some("Manages collision detection and response")
    } else if hook("Update") {
        Some("Processes input and updates object state")
    } else if hook("FixedUpdate") {
        Some("Manages physics-based behavior")
    } else {
        None
    };
    if let Some(purpose) = by_hooks {
        return purpose.to_string();
    }

    match base_simple_name(unit.base_type.as_deref()) {
        "MonoBehaviour" | "NetworkBehaviour" => "Unity MonoBehaviour component".to_string(),
        "Editor" | "EditorWindow" => "Editor tooling extension".to_string(),
        _ => String::new(),
    }
}

/// Role of a `ScriptableObject` asset: settings, lookup table or plain data.
fn asset_purpose(unit: &SourceUnit) -> &'static str {
    let name = unit.name.as_str();
    if ["Settings", "Config", "Configuration"].iter().any(|k| name.contains(k)) {
        return "Configuration data asset";
    }

    let lookups = unit
        .methods
        .iter()
        .filter(|m| m.kind == MethodKind::Method && LOOKUP_PREFIXES.iter().any(|p| m.name.starts_with(p)))
        .count();
    if name.contains("Database") || name.contains("Collection") || lookups > 2 {
        return "Database asset";
    }
    "Data container asset"
}

pub(crate) fn base_simple_name(base: Option<&str>) -> &str {
    let base = base.unwrap_or("");
    let base = base.split('<').next().unwrap_or(base);
    base.rsplit('.').next().unwrap_or(base).trim()
}
