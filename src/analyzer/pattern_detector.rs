use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::analyzer::component_classifier::base_simple_name;
use crate::analyzer::global_index::{normalize_type_name, SymbolIndex};
use crate::parser::references::{truncate_chars, DependencyEdge, DependencyKind};
use crate::parser::symbols::{EnumDecl, MemberDecl, MemberKind, MethodDecl, SourceUnit};

pub const SINGLETON: &str = "Singleton";
pub const PUBLISH_SUBSCRIBE: &str = "Publish-Subscribe";
pub const STATE_MACHINE: &str = "State Machine";
pub const COMPONENT_COMPOSITION: &str = "Component Composition";
pub const OBJECT_POOL: &str = "Object Pool";
pub const SERVICE_LOCATOR: &str = "Service Locator";
pub const FACTORY: &str = "Factory";
pub const COMMAND: &str = "Command";
pub const MODEL_VIEW_CONTROLLER: &str = "Model-View-Controller";
pub const ENTITY_COMPONENT_SYSTEM: &str = "Entity Component System";

const MAX_EVIDENCE_CHARS: usize = 200;
const MIN_STATE_COUNT: usize = 3;
const MIN_COMPOSED_TARGETS: usize = 3;
const MIN_NAMED_SYSTEMS: usize = 3;

const DOTS_SYSTEM_BASES: &[&str] = &["SystemBase", "ComponentSystem", "JobComponentSystem", "ISystem"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternFinding {
    pub pattern_name: String,
    pub description: String,
    pub components: Vec<String>,
    /// 1.0 for an explicit implementation, lower for partial matches.
    pub confidence: f64,
    pub evidence: String,
    pub primary_file: String,
}

impl PatternFinding {
    fn new(
        pattern_name: &str,
        description: &str,
        components: Vec<String>,
        confidence: f64,
        evidence: &[String],
        primary_file: &str,
    ) -> Self {
        Self {
            pattern_name: pattern_name.to_string(),
            description: description.to_string(),
            components,
            confidence: confidence.clamp(0.0, 1.0),
            evidence: truncate_chars(&evidence.join(" | "), MAX_EVIDENCE_CHARS),
            primary_file: primary_file.to_string(),
        }
    }
}

/// Rule-based detection over the indexed units and their dependency edges.
pub struct PatternDetector<'a> {
    index: &'a SymbolIndex,
    edges: &'a [DependencyEdge],
    dependencies_analyzed: bool,
}

impl<'a> PatternDetector<'a> {
    /// `edges` must come from a completed dependency pass when
    /// `dependencies_analyzed` is set; rules that need edges are skipped
    /// otherwise.
    pub fn new(index: &'a SymbolIndex, edges: &'a [DependencyEdge], dependencies_analyzed: bool) -> Self {
        Self {
            index,
            edges,
            dependencies_analyzed,
        }
    }

    pub fn detect_all(&self) -> Vec<PatternFinding> {
        let mut findings = Vec::new();

        for unit in self.index.units() {
            findings.extend(self.detect_singleton(unit));
            findings.extend(self.detect_state_machine(unit));
            findings.extend(self.detect_object_pool(unit));
            findings.extend(self.detect_service_locator(unit));
            findings.extend(self.detect_factory(unit));
            if self.dependencies_analyzed {
                findings.extend(self.detect_publish_subscribe(unit));
                findings.extend(self.detect_component_composition(unit));
            }
        }
        findings.extend(self.detect_command());
        findings.extend(self.detect_model_view_controller());
        findings.extend(self.detect_entity_component_system());

        sort_findings(&mut findings);
        debug!("Detected {} pattern findings", findings.len());
        findings
    }

    pub fn detect_singleton(&self, unit: &SourceUnit) -> Option<PatternFinding> {
        let holders: Vec<&MemberDecl> = unit
            .members
            .iter()
            .filter(|m| m.is_static && m.kind != MemberKind::Event && is_self_typed(unit, m))
            .collect();
        if holders.is_empty() {
            return None;
        }

        let self_name = regex::escape(&unit.name);
        let mut evidence = vec![format!(
            "static {} {}",
            holders[0].declared_type, holders[0].name
        )];
        let mut guard = None;
        let mut assignment = None;

        for holder in &holders {
            let name = regex::escape(&holder.name);
            let Some(assign_re) = compile(&format!(r"\b{}\s*(?:\?\?)?=([^=;][^;]*)", name)) else {
                continue;
            };
            let Some(condition_re) = compile(&format!(
                r"\bif\s*\([^)]*\b{}\b[^)]*\)|\b{}\s*\?\?=",
                name, name
            )) else {
                continue;
            };
            let Some(construct_re) = compile(&format!(
                r"^\s*this\b|\b(?:FindObjectOfType|FindFirstObjectByType|FindAnyObjectByType|AddComponent)\s*<\s*{}\s*>|\bnew\s+{}\s*\(",
                self_name, self_name
            )) else {
                continue;
            };

            for method in &unit.methods {
                let body = &method.masked_body;

                let assigned = assign_re.captures_iter(body).find_map(|caps| {
                    let rhs = caps.get(1)?;
                    construct_re.is_match(rhs.as_str()).then(|| caps.get(0).map(|m| m.start()))?
                });
                if assignment.is_none() {
                    if let Some(offset) = assigned {
                        assignment = Some(line_at(method, offset));
                    }
                }

                if guard.is_none() {
                    if let Some(condition) = condition_re.find(body) {
                        let destroys = body.contains("Destroy(");
                        let lazy = condition.as_str().contains("??=")
                            || (condition.as_str().contains("null") && assigned.is_some());
                        if destroys || lazy {
                            guard = Some(line_at(method, condition.start()));
                        }
                    }
                }
            }
        }

        let confidence = if guard.is_some() && assignment.is_some() { 1.0 } else { 0.6 };
        evidence.extend(guard);
        evidence.extend(assignment);

        debug!("Singleton candidate {} (confidence {:.2})", unit.qualified_name, confidence);
        Some(PatternFinding::new(
            SINGLETON,
            "Static self-typed instance providing global access",
            vec![unit.qualified_name.clone()],
            confidence,
            &evidence,
            &unit.file_path,
        ))
    }

    pub fn detect_publish_subscribe(&self, unit: &SourceUnit) -> Option<PatternFinding> {
        let events: Vec<&str> = unit.event_like_members().map(|m| m.name.as_str()).collect();
        if events.len() < 2 {
            return None;
        }

        let subscriptions: Vec<&DependencyEdge> = self
            .edges
            .iter()
            .filter(|e| {
                e.kind == DependencyKind::EventSubscribe
                    && e.resolved
                    && e.target == unit.qualified_name
                    && e.source != unit.qualified_name
            })
            .collect();
        let subscribers: BTreeSet<&str> = subscriptions.iter().map(|e| e.source.as_str()).collect();
        if subscribers.is_empty() {
            return None;
        }

        let confidence = (0.5 + 0.25 * subscribers.len() as f64).min(1.0);
        let mut components = vec![unit.qualified_name.clone()];
        components.extend(subscribers.iter().map(|s| s.to_string()));

        let mut evidence = vec![
            format!("events: {}", events.join(", ")),
            format!(
                "subscribers: {}",
                subscribers.iter().copied().collect::<Vec<_>>().join(", ")
            ),
        ];
        evidence.extend(subscriptions.first().map(|e| e.context.clone()));

        Some(PatternFinding::new(
            PUBLISH_SUBSCRIBE,
            "Events raised by one component and observed by others",
            components,
            confidence,
            &evidence,
            &unit.file_path,
        ))
    }

    pub fn detect_state_machine(&self, unit: &SourceUnit) -> Option<PatternFinding> {
        let mut best: Option<(f64, f64, &str, Vec<String>)> = None;

        for field in unit.members.iter().filter(|m| m.kind != MemberKind::Event) {
            let Some(states) = self.enum_for(unit, &field.declared_type) else {
                continue;
            };
            if states.values.len() < MIN_STATE_COUNT {
                continue;
            }
            let Some((handled, how)) = handled_states(unit, &field.name, states) else {
                continue;
            };

            let coverage = handled as f64 / states.values.len() as f64;
            let confidence = if coverage >= 2.0 / 3.0 { 1.0 } else { 0.5 };
            let evidence = vec![
                format!("enum {} ({} states)", states.name, states.values.len()),
                format!("{} on {} handles {}/{}", how.0, field.name, handled, states.values.len()),
                how.1,
            ];

            let better = match &best {
                None => true,
                Some((c, cov, name, _)) => {
                    confidence > *c
                        || (confidence == *c && coverage > *cov)
                        || (confidence == *c && coverage == *cov && field.name.as_str() < *name)
                }
            };
            if better {
                best = Some((confidence, coverage, &field.name, evidence));
            }
        }

        let (confidence, _, _, evidence) = best?;
        Some(PatternFinding::new(
            STATE_MACHINE,
            "Enum-typed state field driving explicit transitions",
            vec![unit.qualified_name.clone()],
            confidence,
            &evidence,
            &unit.file_path,
        ))
    }

    fn enum_for(&self, unit: &SourceUnit, declared_type: &str) -> Option<&'a EnumDecl> {
        let name = normalize_type_name(declared_type);
        let simple = name.rsplit('.').next().unwrap_or(name);
        if unit.nested_enum(simple).is_some() {
            let qualified = format!("{}.{}", unit.qualified_name, simple);
            return self.index.find_enum(&qualified, &unit.namespace);
        }
        self.index.find_enum(name, &unit.namespace)
    }

    pub fn detect_component_composition(&self, unit: &SourceUnit) -> Option<PatternFinding> {
        let composed: BTreeSet<&str> = self
            .edges
            .iter()
            .filter(|e| {
                e.source == unit.qualified_name
                    && e.source_file == unit.file_path
                    && matches!(
                        e.kind,
                        DependencyKind::Lookup
                            | DependencyKind::RequireComponent
                            | DependencyKind::Composition
                    )
            })
            .map(|e| e.target.as_str())
            .collect();
        if composed.len() < MIN_COMPOSED_TARGETS {
            return None;
        }

        let confidence = (0.5 + 0.1 * composed.len() as f64).min(0.95);
        let targets: Vec<&str> = composed.iter().copied().collect();
        Some(PatternFinding::new(
            COMPONENT_COMPOSITION,
            "Behaviour assembled from several collaborating components",
            vec![unit.qualified_name.clone()],
            confidence,
            &[format!("depends on {} components: {}", targets.len(), targets.join(", "))],
            &unit.file_path,
        ))
    }

    pub fn detect_object_pool(&self, unit: &SourceUnit) -> Option<PatternFinding> {
        let pool_field = unit.fields().find(|f| {
            let base = normalize_type_name(&f.declared_type);
            let simple = base.rsplit('.').next().unwrap_or(base);
            let collection = matches!(simple, "Queue" | "Stack")
                || (simple == "List" && f.name.to_lowercase().contains("pool"));
            collection || f.declared_type.contains("Pool")
        })?;

        let toggles_activity = unit
            .methods
            .iter()
            .any(|m| m.masked_body.contains("SetActive("));
        if !toggles_activity {
            return None;
        }

        let acquire = method_with_prefix(unit, &["Get", "Spawn", "Acquire", "Take", "Rent"])?;
        let release = method_with_prefix(unit, &["Return", "Release", "Despawn", "Recycle"])?;

        Some(PatternFinding::new(
            OBJECT_POOL,
            "Reuses deactivated instances instead of creating new ones",
            vec![unit.qualified_name.clone()],
            0.8,
            &[
                format!("{} {}", pool_field.declared_type, pool_field.name),
                format!("{} / {}", acquire, release),
            ],
            &unit.file_path,
        ))
    }

    /// Type-keyed registry with register and resolve methods.
    pub fn detect_service_locator(&self, unit: &SourceUnit) -> Option<PatternFinding> {
        let registry = unit.fields().find(|f| {
            let ty = f.declared_type.replace(' ', "");
            (ty.starts_with("Dictionary<") || ty.starts_with("IDictionary<"))
                && (ty.contains("<Type,") || ty.contains("<System.Type,"))
        })?;
        let register = method_with_prefix(unit, &["Register", "Add"])?;
        let resolve = method_with_prefix(unit, &["Get", "Resolve", "Locate", "Find"])?;

        let named = unit.name.contains("Locator") || unit.name.contains("Service");
        Some(PatternFinding::new(
            SERVICE_LOCATOR,
            "Central registry handing out services by type",
            vec![unit.qualified_name.clone()],
            if named { 0.8 } else { 0.7 },
            &[
                format!("{} {}", registry.declared_type, registry.name),
                format!("{} / {}", register, resolve),
            ],
            &unit.file_path,
        ))
    }

    pub fn detect_factory(&self, unit: &SourceUnit) -> Option<PatternFinding> {
        if !["Factory", "Creator", "Builder"].iter().any(|k| unit.name.contains(k)) {
            return None;
        }
        let create = unit
            .methods
            .iter()
            .find(|m| ["Create", "Build", "Make", "Spawn"].iter().any(|p| m.name.starts_with(p)))?;

        let constructs = create.masked_body.contains("Instantiate") || create.masked_body.contains("new ");
        let mut evidence = vec![format!("creation method {}", create.name)];
        if constructs {
            evidence.push("constructs instances".to_string());
        }
        Some(PatternFinding::new(
            FACTORY,
            "Encapsulates object creation behind a dedicated type",
            vec![unit.qualified_name.clone()],
            if constructs { 0.7 } else { 0.5 },
            &evidence,
            &unit.file_path,
        ))
    }

    fn units_named(&self, role: &str) -> Vec<&'a SourceUnit> {
        self.index
            .units()
            .iter()
            .filter(|u| u.name.contains(role))
            .collect()
    }

    /// One project-wide finding for `*Command` types exposing `Execute`.
    pub fn detect_command(&self) -> Option<PatternFinding> {
        let commands: Vec<&SourceUnit> = self
            .index
            .units()
            .iter()
            .filter(|u| u.name.contains("Command") && has_method(u, "Execute"))
            .collect();
        let first = commands.first()?;

        let undoable: Vec<&str> = commands
            .iter()
            .filter(|u| has_method(u, "Undo"))
            .map(|u| u.name.as_str())
            .collect();
        let mut evidence = vec![format!(
            "{} command types with Execute",
            commands.len()
        )];
        if !undoable.is_empty() {
            evidence.push(format!("undo: {}", undoable.join(", ")));
        }
        Some(PatternFinding::new(
            COMMAND,
            "Requests wrapped as executable objects",
            sorted_names(&commands),
            if undoable.is_empty() { 0.5 } else { 0.7 },
            &evidence,
            &first.file_path,
        ))
    }

    /// Controller, view and model types all present. Stronger when a
    /// controller depends on one of the others.
    pub fn detect_model_view_controller(&self) -> Option<PatternFinding> {
        let controllers = self.units_named("Controller");
        let views = self.units_named("View");
        let models = self.units_named("Model");
        if controllers.is_empty() || views.is_empty() || models.is_empty() {
            return None;
        }

        let involved: Vec<&SourceUnit> = controllers.iter().chain(&views).chain(&models).copied().collect();
        let partners: BTreeSet<&str> = views
            .iter()
            .chain(&models)
            .map(|u| u.qualified_name.as_str())
            .collect();
        let wired = self.edges.iter().find(|e| {
            e.resolved
                && partners.contains(e.target.as_str())
                && controllers.iter().any(|c| c.qualified_name == e.source)
        });

        let mut evidence = vec![format!(
            "{} controllers, {} views, {} models",
            controllers.len(),
            views.len(),
            models.len()
        )];
        evidence.extend(wired.map(|e| format!("{} -> {}", e.source, e.target)));
        Some(PatternFinding::new(
            MODEL_VIEW_CONTROLLER,
            "Presentation split into model, view and controller types",
            sorted_names(&involved),
            if wired.is_some() { 0.6 } else { 0.4 },
            &evidence,
            &controllers[0].file_path,
        ))
    }

    /// DOTS system types, or failing that a cluster of `*System` classes.
    pub fn detect_entity_component_system(&self) -> Option<PatternFinding> {
        let units = self.index.units();
        let dots: Vec<&SourceUnit> = units
            .iter()
            .filter(|u| DOTS_SYSTEM_BASES.contains(&base_simple_name(u.base_type.as_deref())))
            .collect();

        let (systems, confidence, evidence) = if !dots.is_empty() {
            let bases: BTreeSet<&str> = dots
                .iter()
                .map(|u| base_simple_name(u.base_type.as_deref()))
                .collect();
            let evidence = format!(
                "{} systems derived from {}",
                dots.len(),
                bases.into_iter().collect::<Vec<_>>().join(", ")
            );
            (dots, 0.8, evidence)
        } else {
            let named: Vec<&SourceUnit> = units.iter().filter(|u| u.name.ends_with("System")).collect();
            if named.len() < MIN_NAMED_SYSTEMS {
                return None;
            }
            let evidence = format!("{} classes named *System", named.len());
            (named, 0.4, evidence)
        };

        Some(PatternFinding::new(
            ENTITY_COMPONENT_SYSTEM,
            "Behaviour organised as systems iterating over component data",
            sorted_names(&systems),
            confidence,
            &[evidence],
            &systems[0].file_path,
        ))
    }
}

/// Orders findings by (pattern name, components, primary file, evidence).
pub fn sort_findings(findings: &mut [PatternFinding]) {
    findings.sort_by(|a, b| {
        a.pattern_name
            .cmp(&b.pattern_name)
            .then_with(|| a.components.cmp(&b.components))
            .then_with(|| a.primary_file.cmp(&b.primary_file))
            .then_with(|| a.evidence.cmp(&b.evidence))
    });
}

fn method_with_prefix(unit: &SourceUnit, prefixes: &[&str]) -> Option<String> {
    unit.methods
        .iter()
        .find(|m| prefixes.iter().any(|p| m.name.starts_with(p)))
        .map(|m| m.name.clone())
}

fn has_method(unit: &SourceUnit, name: &str) -> bool {
    unit.methods.iter().any(|m| m.name == name)
}

fn sorted_names(units: &[&SourceUnit]) -> Vec<String> {
    let mut names: Vec<String> = units.iter().map(|u| u.qualified_name.clone()).collect();
    names.sort();
    names.dedup();
    names
}

fn is_self_typed(unit: &SourceUnit, member: &MemberDecl) -> bool {
    let ty = normalize_type_name(&member.declared_type);
    ty == unit.name || ty == unit.qualified_name
}

/// Best dispatch on `field` across all switch statements, switch expressions
/// and the unit's if-chain. Returns the count of distinct enum values handled
/// with the dispatch kind and its first line.
fn handled_states(
    unit: &SourceUnit,
    field: &str,
    states: &EnumDecl,
) -> Option<(usize, (&'static str, String))> {
    let field = regex::escape(field);
    let switch_re = compile(&format!(r"\bswitch\s*\(\s*(?:this\s*\.\s*)?{}\s*\)", field))?;
    let switch_expr_re = compile(&format!(r"\b(?:this\s*\.\s*)?{}\s+switch\s*\{{", field))?;
    let case_re = compile(r"\bcase\s+([\w.]+)\s*(?:when\b[^:]*)?:")?;
    let arm_re = compile(r"([\w.]+)\s*(?:when\b[^=]*)?=>")?;
    let compare_re = compile(&format!(
        r"\b{f}\s*==\s*([\w.]+)|([\w.]+)\s*==\s*(?:this\s*\.\s*)?{f}\b",
        f = field
    ))?;

    let is_state = |written: &str| {
        let last = written.rsplit('.').next().unwrap_or(written);
        states.values.iter().any(|v| v == last).then(|| last.to_string())
    };
    let count_in = |re: &Regex, block: &str| {
        re.captures_iter(block)
            .filter_map(|c| c.get(1).and_then(|m| is_state(m.as_str())))
            .collect::<BTreeSet<String>>()
            .len()
    };

    let mut best: Option<(usize, (&'static str, String))> = None;
    let mut consider = |handled: usize, how: &'static str, line: String| {
        if best.as_ref().map(|(n, _)| handled > *n).unwrap_or(true) {
            best = Some((handled, (how, line)));
        }
    };

    for method in &unit.methods {
        let body = &method.masked_body;
        for found in switch_re.find_iter(body) {
            if let Some(block) = brace_block(body, found.end()) {
                consider(count_in(&case_re, block), "switch", line_at(method, found.start()));
            }
        }
        for found in switch_expr_re.find_iter(body) {
            if let Some(block) = brace_block(body, found.end() - 1) {
                consider(count_in(&arm_re, block), "switch expression", line_at(method, found.start()));
            }
        }
    }

    let mut handled: BTreeSet<String> = BTreeSet::new();
    let mut first_line = None;
    for method in &unit.methods {
        for caps in compare_re.captures_iter(&method.masked_body) {
            let written = caps.get(1).or_else(|| caps.get(2));
            if let Some(state) = written.and_then(|m| is_state(m.as_str())) {
                handled.insert(state);
                if first_line.is_none() {
                    first_line = caps.get(0).map(|m| line_at(method, m.start()));
                }
            }
        }
    }
    if handled.len() >= 2 {
        consider(handled.len(), "if-chain", first_line.unwrap_or_default());
    }

    best
}

/// Contents of the first `{ ... }` block opening at or after `from`.
/// An unclosed block runs to the end of `text`.
fn brace_block(text: &str, from: usize) -> Option<&str> {
    let open = from + text.get(from..)?.find('{')?;
    let mut depth = 0usize;
    for (offset, b) in text.as_bytes()[open..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return text.get(open + 1..open + offset);
                }
            }
            _ => {}
        }
    }
    text.get(open + 1..)
}

fn line_at(method: &MethodDecl, offset: usize) -> String {
    let body = &method.body;
    let offset = offset.min(body.len());
    let start = body[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0);
    let end = body[offset..].find('\n').map(|p| offset + p).unwrap_or(body.len());
    body[start..end].trim().to_string()
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("Skipping rule pattern {}: {}", pattern, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::framework_patterns::FrameworkPatterns;
    use crate::parser::{CSharpParser, DependencyExtractor};

    fn detect(sources: &[(&str, &str)]) -> Vec<PatternFinding> {
        let parser = CSharpParser::new().unwrap();
        let mut units = Vec::new();
        let mut enums = Vec::new();
        for (path, source) in sources {
            let parsed = parser.parse_source(source, path);
            units.extend(parsed.units);
            enums.extend(parsed.enums);
        }
        let index = SymbolIndex::build(units, enums);
        let patterns = FrameworkPatterns::default();
        let edges = DependencyExtractor::new(&index, &patterns).unwrap().extract_all();
        PatternDetector::new(&index, &edges, true).detect_all()
    }

    fn find<'f>(findings: &'f [PatternFinding], name: &str) -> Option<&'f PatternFinding> {
        findings.iter().find(|f| f.pattern_name == name)
    }

    #[test]
    fn test_singleton_full() {
        let findings = detect(&[(
            "AudioHub.cs",
            r#"
public class AudioHub : MonoBehaviour
{
    public static AudioHub Instance { get; private set; }

    void Awake()
    {
        if (Instance != null && Instance != this)
        {
            Destroy(gameObject);
            return;
        }
        Instance = this;
    }
}
"#,
        )]);
        let singleton = find(&findings, SINGLETON).unwrap();
        assert_eq!(singleton.confidence, 1.0);
        assert_eq!(singleton.components, vec!["AudioHub"]);
        assert!(singleton.evidence.contains("Instance = this;"));
    }

    #[test]
    fn test_singleton_lazy_getter() {
        let findings = detect(&[(
            "Registry.cs",
            r#"
public class Registry : MonoBehaviour
{
    private static Registry instance;
    public static Registry Instance
    {
        get
        {
            if (instance == null)
            {
                instance = FindObjectOfType<Registry>();
            }
            return instance;
        }
    }
}
"#,
        )]);
        assert_eq!(find(&findings, SINGLETON).unwrap().confidence, 1.0);
    }

    #[test]
    fn test_singleton_field_only() {
        let findings = detect(&[(
            "Config.cs",
            "public class Config : MonoBehaviour { public static Config Current; }",
        )]);
        let singleton = find(&findings, SINGLETON).unwrap();
        assert_eq!(singleton.confidence, 0.6);
    }

    #[test]
    fn test_publish_subscribe_confidence() {
        let findings = detect(&[
            (
                "Health.cs",
                r#"
public class Health : MonoBehaviour
{
    public event System.Action OnDied;
    public event System.Action<int> OnDamaged;
}
"#,
            ),
            (
                "Hud.cs",
                r#"
public class Hud : MonoBehaviour
{
    [SerializeField] private Health health;
    void OnEnable() { health.OnDamaged += Refresh; }
    void Refresh(int amount) { }
}
"#,
            ),
            (
                "Score.cs",
                r#"
public class Score : MonoBehaviour
{
    private Health target;
    void Start() { target.OnDied += () => Add(10); }
    void Add(int points) { }
}
"#,
            ),
        ]);
        let finding = find(&findings, PUBLISH_SUBSCRIBE).unwrap();
        assert_eq!(finding.components, vec!["Health", "Hud", "Score"]);
        assert_eq!(finding.confidence, 1.0);
    }

    #[test]
    fn test_state_machine_switch() {
        let findings = detect(&[(
            "Guard.cs",
            r#"
public class Guard : MonoBehaviour
{
    private enum GuardState { Idle, Patrol, Chase, Attack }
    private GuardState state = GuardState.Idle;

    void Update()
    {
        switch (state)
        {
            case GuardState.Idle: break;
            case GuardState.Patrol: break;
            case GuardState.Chase: break;
        }
    }
}
"#,
        )]);
        let finding = find(&findings, STATE_MACHINE).unwrap();
        assert_eq!(finding.confidence, 1.0);
        assert!(finding.evidence.starts_with("enum GuardState (4 states)"));
    }

    #[test]
    fn test_state_machine_partial_if_chain() {
        let findings = detect(&[
            (
                "Phase.cs",
                "public enum Phase { Intro, Play, Pause, Victory, Defeat, Credits }",
            ),
            (
                "Flow.cs",
                r#"
public class Flow : MonoBehaviour
{
    public Phase phase;
    void Update()
    {
        if (phase == Phase.Intro) { }
        else if (phase == Phase.Play) { }
    }
}
"#,
            ),
        ]);
        let finding = find(&findings, STATE_MACHINE).unwrap();
        assert_eq!(finding.confidence, 0.5);
    }

    #[test]
    fn test_small_enum_is_not_state_machine() {
        let findings = detect(&[(
            "Door.cs",
            r#"
public class Door : MonoBehaviour
{
    enum DoorState { Open, Closed }
    DoorState state;
    void Update() { switch (state) { case DoorState.Open: break; case DoorState.Closed: break; } }
}
"#,
        )]);
        assert!(find(&findings, STATE_MACHINE).is_none());
    }

    #[test]
    fn test_object_pool() {
        let findings = detect(&[(
            "BulletPool.cs",
            r#"
public class BulletPool : MonoBehaviour
{
    private Queue<GameObject> pool = new Queue<GameObject>();

    public GameObject Get()
    {
        var bullet = pool.Dequeue();
        bullet.SetActive(true);
        return bullet;
    }

    public void Return(GameObject bullet)
    {
        bullet.SetActive(false);
        pool.Enqueue(bullet);
    }
}
"#,
        )]);
        let finding = find(&findings, OBJECT_POOL).unwrap();
        assert_eq!(finding.confidence, 0.8);
        assert!(finding.evidence.contains("Get / Return"));
    }

    #[test]
    fn test_findings_sorted() {
        let findings = detect(&[
            ("B.cs", "public class B : MonoBehaviour { public static B Instance; }"),
            ("A.cs", "public class A : MonoBehaviour { public static A Instance; }"),
        ]);
        let names: Vec<_> = findings.iter().map(|f| f.components[0].as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_state_machine_uses_best_switch() {
        let findings = detect(&[(
            "Gate.cs",
            r#"
public class Gate : MonoBehaviour
{
    enum S { A, B, C, D }
    S state;
    void Log() { switch (state) { case S.A: break; } }
    void Update()
    {
        switch (state)
        {
            case S.A:
            case S.B: break;
            case S.C: break;
            case S.D: break;
        }
    }
}
"#,
        )]);
        let finding = find(&findings, STATE_MACHINE).unwrap();
        assert_eq!(finding.confidence, 1.0);
        assert!(finding.evidence.contains("switch on state handles 4/4"), "{}", finding.evidence);
    }

    #[test]
    fn test_state_machine_counts_only_own_cases() {
        let findings = detect(&[(
            "Lamp.cs",
            r#"
public class Lamp : MonoBehaviour
{
    enum S { A, B, C, D }
    S state;
    S other;
    void Update()
    {
        switch (state) { case S.A: break; }
        switch (other) { case S.B: case S.C: break; }
    }
}
"#,
        )]);
        let finding = find(&findings, STATE_MACHINE).unwrap();
        assert_eq!(finding.confidence, 0.5);
        assert!(finding.evidence.contains("handles 2/4"), "{}", finding.evidence);
        assert!(finding.evidence.contains("switch on other"));
    }

    #[test]
    fn test_state_machine_switch_expression() {
        let findings = detect(&[(
            "Valve.cs",
            r#"
public class Valve : MonoBehaviour
{
    public enum S { Open, Closing, Closed }
    public S state;

    float Speed() => state switch
    {
        S.Open => 1f,
        S.Closing => 0.5f,
        _ => 0f,
    };
}
"#,
        )]);
        let finding = find(&findings, STATE_MACHINE).unwrap();
        assert_eq!(finding.confidence, 1.0);
        assert!(
            finding.evidence.contains("switch expression on state handles 2/3"),
            "{}",
            finding.evidence
        );
    }

    #[test]
    fn test_service_locator() {
        let findings = detect(&[(
            "ServiceLocator.cs",
            r#"
public class ServiceLocator
{
    private static readonly Dictionary<Type, object> services = new Dictionary<Type, object>();
    public static void Register<T>(T service) { services[typeof(T)] = service; }
    public static T Get<T>() { return (T)services[typeof(T)]; }
}
"#,
        )]);
        let finding = find(&findings, SERVICE_LOCATOR).unwrap();
        assert_eq!(finding.confidence, 0.8);
        assert!(finding.evidence.contains("Register / Get"));
        assert!(find(&findings, FACTORY).is_none());
    }

    #[test]
    fn test_factory() {
        let findings = detect(&[
            (
                "EnemyFactory.cs",
                r#"
public class EnemyFactory : MonoBehaviour
{
    [SerializeField] private GameObject prefab;
    public GameObject CreateEnemy(Vector3 at) { return Instantiate(prefab, at, Quaternion.identity); }
}
"#,
            ),
            ("LevelBuilder.cs", "public class LevelBuilder { public void BuildRoom() { } }"),
        ]);
        let factories: Vec<(&str, f64)> = findings
            .iter()
            .filter(|f| f.pattern_name == FACTORY)
            .map(|f| (f.components[0].as_str(), f.confidence))
            .collect();
        assert_eq!(factories, vec![("EnemyFactory", 0.7), ("LevelBuilder", 0.5)]);
    }

    #[test]
    fn test_command_groups_all_commands() {
        let findings = detect(&[
            ("MoveCommand.cs", "public class MoveCommand { public void Execute() { } public void Undo() { } }"),
            ("JumpCommand.cs", "public class JumpCommand { public void Execute() { } }"),
            ("CommandQueue.cs", "public class CommandQueue { public void Push() { } }"),
        ]);
        let commands: Vec<&PatternFinding> = findings.iter().filter(|f| f.pattern_name == COMMAND).collect();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].components, vec!["JumpCommand", "MoveCommand"]);
        assert_eq!(commands[0].confidence, 0.7);
        assert!(commands[0].evidence.contains("undo: MoveCommand"));
    }

    #[test]
    fn test_model_view_controller() {
        let sources = [
            ("ShopModel.cs", "public class ShopModel { public int gold; }"),
            ("ShopView.cs", "public class ShopView : MonoBehaviour { public void Show(int gold) { } }"),
            (
                "ShopController.cs",
                "public class ShopController : MonoBehaviour { [SerializeField] private ShopView view; private ShopModel model; }",
            ),
        ];
        let findings = detect(&sources);
        let finding = find(&findings, MODEL_VIEW_CONTROLLER).unwrap();
        assert_eq!(finding.components, vec!["ShopController", "ShopModel", "ShopView"]);
        assert_eq!(finding.confidence, 0.6);

        let findings = detect(&sources[..2]);
        assert!(find(&findings, MODEL_VIEW_CONTROLLER).is_none());
    }

    #[test]
    fn test_entity_component_system() {
        let findings = detect(&[(
            "MoveSystem.cs",
            "public partial class MoveSystem : SystemBase { protected override void OnUpdate() { } }",
        )]);
        let finding = find(&findings, ENTITY_COMPONENT_SYSTEM).unwrap();
        assert_eq!(finding.confidence, 0.8);
        assert!(finding.evidence.contains("derived from SystemBase"));

        let findings = detect(&[
            ("A.cs", "public class AudioSystem { }"),
            ("B.cs", "public class WeatherSystem { }"),
        ]);
        assert!(find(&findings, ENTITY_COMPONENT_SYSTEM).is_none());

        let findings = detect(&[
            ("A.cs", "public class AudioSystem { }"),
            ("B.cs", "public class WeatherSystem { }"),
            ("C.cs", "public class QuestSystem { }"),
        ]);
        assert_eq!(find(&findings, ENTITY_COMPONENT_SYSTEM).unwrap().confidence, 0.4);
    }
}
