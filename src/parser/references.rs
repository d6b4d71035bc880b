use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::framework_patterns::FrameworkPatterns;
use crate::analyzer::global_index::{element_type_name, normalize_type_name, SymbolIndex};
use crate::parser::csharp_parser::attribute_name;
use crate::parser::symbols::{MemberKind, MethodDecl, SourceUnit};

const MAX_CONTEXT_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Lookup,
    SingletonAccess,
    EventSubscribe,
    Composition,
    RequireComponent,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DependencyKind::Lookup => "lookup",
            DependencyKind::SingletonAccess => "singleton-access",
            DependencyKind::EventSubscribe => "event-subscribe",
            DependencyKind::Composition => "composition",
            DependencyKind::RequireComponent => "require-component",
        };
        write!(f, "{}", label)
    }
}

/// A directed reference from one unit to another named type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub source_file: String,
    /// Qualified name when resolved, otherwise the name as written.
    pub target: String,
    pub kind: DependencyKind,
    pub context: String,
    pub line: usize,
    pub resolved: bool,
}

impl DependencyEdge {
    fn sort_key(&self) -> (&str, &str, usize, DependencyKind, &str) {
        (&self.source, &self.source_file, self.line, self.kind, &self.target)
    }
}

/// Scans unit bodies for the reference idioms that tie components together.
pub struct DependencyExtractor<'a> {
    index: &'a SymbolIndex,
    lookup_generic_re: Regex,
    lookup_typeof_re: Regex,
    singleton_re: Regex,
    subscribe_re: Regex,
    listener_re: Regex,
    typeof_re: Regex,
    singleton_accessors: Vec<String>,
}

struct BodyMatch<'b> {
    method: &'b MethodDecl,
    offset: usize,
}

impl<'a> DependencyExtractor<'a> {
    pub fn new(index: &'a SymbolIndex, patterns: &FrameworkPatterns) -> Result<Self> {
        let lookups = patterns.lookup_methods.join("|");
        let accessors = patterns.singleton_accessors.join("|");

        Ok(Self {
            index,
            lookup_generic_re: Regex::new(&format!(r"\b(?:{})\s*<\s*([A-Za-z_][\w.]*)", lookups))
                .context("Failed to compile generic lookup pattern")?,
            lookup_typeof_re: Regex::new(&format!(
                r"\b(?:{})\s*\(\s*typeof\s*\(\s*([A-Za-z_][\w.]*)",
                lookups
            ))
            .context("Failed to compile typeof lookup pattern")?,
            singleton_re: Regex::new(&format!(r"(?:^|[^.\w])([A-Z]\w*)\s*\.\s*(?:{})\b", accessors))
                .context("Failed to compile singleton access pattern")?,
            subscribe_re: Regex::new(
                r"([A-Za-z_]\w*(?:\s*\.\s*[A-Za-z_]\w*)*)\s*\.\s*([A-Za-z_]\w*)\s*(?:\+=|-=)([^;]*)",
            )
            .context("Failed to compile subscription pattern")?,
            listener_re: Regex::new(
                r"([A-Za-z_]\w*(?:\s*\.\s*[A-Za-z_]\w*)*)\s*\.\s*([A-Za-z_]\w*)\s*\.\s*(?:AddListener|RemoveListener)\s*\(",
            )
            .context("Failed to compile listener pattern")?,
            typeof_re: Regex::new(r"typeof\s*\(\s*([A-Za-z_][\w.]*)")
                .context("Failed to compile typeof pattern")?,
            singleton_accessors: patterns.singleton_accessors.clone(),
        })
    }

    /// Edges for every unit in the index, deduplicated and sorted.
    pub fn extract_all(&self) -> Vec<DependencyEdge> {
        let mut edges: Vec<DependencyEdge> = (0..self.index.len())
            .flat_map(|idx| self.extract_unit(idx))
            .collect();
        sort_and_dedup(&mut edges);
        edges
    }

    pub fn extract_unit(&self, unit_idx: usize) -> Vec<DependencyEdge> {
        let unit = self.index.unit(unit_idx);
        let mut edges = Vec::new();

        self.extract_required_components(unit, &mut edges);
        self.extract_composition(unit, &mut edges);

        for method in &unit.methods {
            self.extract_lookups(unit, method, &mut edges);
            self.extract_singleton_access(unit, method, &mut edges);
            self.extract_subscriptions(unit, method, &mut edges);
        }

        sort_and_dedup(&mut edges);
        edges
    }

    fn extract_lookups(&self, unit: &SourceUnit, method: &MethodDecl, edges: &mut Vec<DependencyEdge>) {
        for re in [&self.lookup_generic_re, &self.lookup_typeof_re] {
            for caps in re.captures_iter(&method.masked_body) {
                let (Some(whole), Some(ty)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let at = BodyMatch {
                    method,
                    offset: whole.start(),
                };
                self.push_edge(unit, ty.as_str(), DependencyKind::Lookup, &at, edges);
            }
        }
    }

    fn extract_singleton_access(
        &self,
        unit: &SourceUnit,
        method: &MethodDecl,
        edges: &mut Vec<DependencyEdge>,
    ) {
        for caps in self.singleton_re.captures_iter(&method.masked_body) {
            let Some(receiver) = caps.get(1) else {
                continue;
            };
            if unit.member(receiver.as_str()).is_some() {
                continue;
            }
            let at = BodyMatch {
                method,
                offset: receiver.start(),
            };
            self.push_edge(unit, receiver.as_str(), DependencyKind::SingletonAccess, &at, edges);
        }
    }

    fn extract_subscriptions(
        &self,
        unit: &SourceUnit,
        method: &MethodDecl,
        edges: &mut Vec<DependencyEdge>,
    ) {
        for caps in self.subscribe_re.captures_iter(&method.masked_body) {
            let (Some(receiver), Some(member), Some(rhs)) = (caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };
            let rhs = rhs.as_str();
            let handler_like = rhs.contains("=>") || rhs.contains("delegate");
            self.push_subscription(unit, method, receiver.as_str(), member.as_str(), handler_like, receiver.start(), edges);
        }

        for caps in self.listener_re.captures_iter(&method.masked_body) {
            let (Some(receiver), Some(member)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            self.push_subscription(unit, method, receiver.as_str(), member.as_str(), true, receiver.start(), edges);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_subscription(
        &self,
        unit: &SourceUnit,
        method: &MethodDecl,
        receiver: &str,
        member: &str,
        handler_like: bool,
        offset: usize,
        edges: &mut Vec<DependencyEdge>,
    ) {
        let Some(target) = self.receiver_type(unit, method, receiver) else {
            return;
        };

        let accepted = match self.index.resolve(&target, &unit.namespace) {
            Some(idx) => self.index.unit(idx).declares_event(member),
            None => handler_like || looks_like_event(member),
        };
        if accepted {
            let at = BodyMatch { method, offset };
            self.push_edge(unit, &target, DependencyKind::EventSubscribe, &at, edges);
        }
    }

    /// Type named by a subscription receiver such as `player`,
    /// `GameManager.Instance` or `this.health.events`. `None` when the
    /// receiver is a local whose type is not written out.
    fn receiver_type(&self, unit: &SourceUnit, method: &MethodDecl, receiver: &str) -> Option<String> {
        let mut segments: Vec<&str> = receiver.split('.').map(str::trim).collect();
        if segments.first() == Some(&"this") {
            segments.remove(0);
        }
        let (&first, rest) = segments.split_first()?;

        // Locals and parameters shadow fields.
        let declared = method
            .local(first)
            .map(|l| l.declared_type.as_str())
            .or_else(|| unit.member(first).map(|m| m.declared_type.as_str()));
        if let Some(declared) = declared {
            let mut current = declared.to_string();
            for segment in rest {
                let Some(idx) = self.index.resolve(&current, &unit.namespace) else {
                    break;
                };
                match self.index.unit(idx).member(segment) {
                    Some(next) => current = next.declared_type.clone(),
                    None => break,
                }
            }
            return Some(normalize_type_name(&current).to_string());
        }

        if segments.len() >= 2 {
            let last = segments[segments.len() - 1];
            if self.singleton_accessors.iter().any(|a| a == last) {
                return Some(segments[segments.len() - 2].to_string());
            }
        }

        if starts_lowercase(first) {
            return None;
        }
        segments.last().map(|last| last.to_string())
    }

    fn extract_composition(&self, unit: &SourceUnit, edges: &mut Vec<DependencyEdge>) {
        for field in unit.members.iter().filter(|m| m.kind == MemberKind::Field) {
            let element = element_type_name(&field.declared_type);
            let Some(idx) = self.index.resolve(element, &unit.namespace) else {
                continue;
            };
            let target = self.index.unit(idx);
            if target.qualified_name == unit.qualified_name {
                continue;
            }
            edges.push(DependencyEdge {
                source: unit.qualified_name.clone(),
                source_file: unit.file_path.clone(),
                target: target.qualified_name.clone(),
                kind: DependencyKind::Composition,
                context: truncate_chars(&format!("{} {}", field.declared_type, field.name), MAX_CONTEXT_CHARS),
                line: field.line,
                resolved: true,
            });
        }
    }

    fn extract_required_components(&self, unit: &SourceUnit, edges: &mut Vec<DependencyEdge>) {
        for attribute in unit
            .attributes
            .iter()
            .filter(|a| attribute_name(a) == "RequireComponent")
        {
            for caps in self.typeof_re.captures_iter(attribute) {
                let Some(ty) = caps.get(1) else {
                    continue;
                };
                let context = truncate_chars(&format!("[{}]", attribute), MAX_CONTEXT_CHARS);
                if let Some(edge) = self.make_edge(unit, ty.as_str(), DependencyKind::RequireComponent, context, unit.line_start) {
                    edges.push(edge);
                }
            }
        }
    }

    fn push_edge(
        &self,
        unit: &SourceUnit,
        written: &str,
        kind: DependencyKind,
        at: &BodyMatch<'_>,
        edges: &mut Vec<DependencyEdge>,
    ) {
        let (line, context) = locate(at.method, at.offset);
        if let Some(edge) = self.make_edge(unit, written, kind, context, line) {
            edges.push(edge);
        }
    }

    fn make_edge(
        &self,
        unit: &SourceUnit,
        written: &str,
        kind: DependencyKind,
        context: String,
        line: usize,
    ) -> Option<DependencyEdge> {
        let written = normalize_type_name(written);
        if written.is_empty() {
            return None;
        }

        let (target, resolved) = match self.index.resolve(written, &unit.namespace) {
            Some(idx) => (self.index.unit(idx).qualified_name.clone(), true),
            None => (written.to_string(), false),
        };
        if target == unit.qualified_name || (!resolved && written == unit.name) {
            return None;
        }

        Some(DependencyEdge {
            source: unit.qualified_name.clone(),
            source_file: unit.file_path.clone(),
            target,
            kind,
            context,
            line,
            resolved,
        })
    }
}

/// Sorts by (source, file, line, kind, target) and drops duplicates.
pub fn sort_and_dedup(edges: &mut Vec<DependencyEdge>) {
    edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()).then_with(|| a.context.cmp(&b.context)));
    edges.dedup_by(|a, b| a.sort_key() == b.sort_key());
}

/// Line number and trimmed source line for an offset into a method body.
fn locate(method: &MethodDecl, offset: usize) -> (usize, String) {
    let body = &method.body;
    let offset = offset.min(body.len());
    let line = method.body_line + method.masked_body[..offset].matches('\n').count();

    let start = body[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0);
    let end = body[offset..].find('\n').map(|p| offset + p).unwrap_or(body.len());
    (line, truncate_chars(body[start..end].trim(), MAX_CONTEXT_CHARS))
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn looks_like_event(member: &str) -> bool {
    let on_prefixed = member
        .strip_prefix("On")
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_uppercase())
        .unwrap_or(false);
    on_prefixed || member.ends_with("Event") || member.ends_with("Changed")
}

fn starts_lowercase(name: &str) -> bool {
    name.chars().next().map(|c| c.is_lowercase() || c == '_').unwrap_or(false)
}
