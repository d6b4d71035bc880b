use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{AnalysisWarning, WarningKind};
use crate::parser::symbols::{EnumDecl, SourceUnit};

const COLLECTION_TYPES: &[&str] = &[
    "List", "HashSet", "Queue", "Stack", "LinkedList", "IList", "ICollection", "IEnumerable",
    "IReadOnlyList", "IReadOnlyCollection",
];

/// Run-wide index of every discovered unit and enum.
///
/// Units are stored in (qualified name, file path) order; every lookup that
/// has to pick among several candidates takes the first in that order, which
/// keeps resolution independent of file processing order.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    units: Vec<SourceUnit>,
    by_name: HashMap<String, Vec<usize>>,
    enums: Vec<EnumDecl>,
    enums_by_name: HashMap<String, Vec<usize>>,
}

impl SymbolIndex {
    pub fn build(mut units: Vec<SourceUnit>, mut enums: Vec<EnumDecl>) -> Self {
        units.sort_by(unit_order);

        for unit in &units {
            enums.extend(unit.enums.iter().cloned());
        }
        enums.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name).then(a.line.cmp(&b.line)));

        let mut index = Self {
            units,
            enums,
            ..Default::default()
        };

        for (idx, unit) in index.units.iter().enumerate() {
            index
                .by_name
                .entry(unit.qualified_name.clone())
                .or_insert_with(Vec::new)
                .push(idx);
            if unit.name != unit.qualified_name {
                index
                    .by_name
                    .entry(unit.name.clone())
                    .or_insert_with(Vec::new)
                    .push(idx);
            }
        }

        for (idx, decl) in index.enums.iter().enumerate() {
            index
                .enums_by_name
                .entry(decl.qualified_name.clone())
                .or_insert_with(Vec::new)
                .push(idx);
            if decl.name != decl.qualified_name {
                index
                    .enums_by_name
                    .entry(decl.name.clone())
                    .or_insert_with(Vec::new)
                    .push(idx);
            }
        }

        index
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    pub fn unit(&self, idx: usize) -> &SourceUnit {
        &self.units[idx]
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Resolves a type name as written in source to a unit index.
    ///
    /// Generic arguments, array ranks and `global::` prefixes are ignored.
    /// Candidates in `from_namespace` win over others.
    pub fn resolve(&self, written: &str, from_namespace: &str) -> Option<usize> {
        let name = normalize_type_name(written);
        if name.is_empty() {
            return None;
        }

        let candidates = self.by_name.get(name).or_else(|| {
            name.rsplit_once('.')
                .and_then(|(_, simple)| self.by_name.get(simple))
        })?;

        candidates
            .iter()
            .copied()
            .find(|&idx| self.units[idx].namespace == from_namespace)
            .or_else(|| candidates.first().copied())
    }

    pub fn find_enum(&self, written: &str, from_namespace: &str) -> Option<&EnumDecl> {
        let name = normalize_type_name(written);
        let candidates = self.enums_by_name.get(name).or_else(|| {
            name.rsplit_once('.')
                .and_then(|(_, simple)| self.enums_by_name.get(simple))
        })?;

        let prefix = format!("{}.", from_namespace);
        candidates
            .iter()
            .map(|&idx| &self.enums[idx])
            .find(|e| !from_namespace.is_empty() && e.qualified_name.starts_with(&prefix))
            .or_else(|| candidates.first().map(|&idx| &self.enums[idx]))
    }

    /// One warning per qualified name declared in more than one file.
    pub fn collision_warnings(&self) -> Vec<AnalysisWarning> {
        let mut files_by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for unit in &self.units {
            let files = files_by_name.entry(unit.qualified_name.as_str()).or_default();
            if !files.contains(&unit.file_path.as_str()) {
                files.push(unit.file_path.as_str());
            }
        }

        files_by_name
            .into_iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(name, files)| {
                AnalysisWarning::new(
                    WarningKind::NameCollision,
                    files[0],
                    format!("'{}' is declared in {} files: {}", name, files.len(), files.join(", ")),
                )
            })
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_units: self.units.len(),
            unique_names: self.by_name.len(),
            total_enums: self.enums.len(),
            namespaces: {
                let mut namespaces: Vec<&str> =
                    self.units.iter().map(|u| u.namespace.as_str()).collect();
                namespaces.sort_unstable();
                namespaces.dedup();
                namespaces.len()
            },
        }
    }
}

/// Canonical unit order: qualified name, then file path, then position.
pub fn unit_order(a: &SourceUnit, b: &SourceUnit) -> Ordering {
    a.qualified_name
        .cmp(&b.qualified_name)
        .then_with(|| a.file_path.cmp(&b.file_path))
        .then_with(|| a.line_start.cmp(&b.line_start))
}

/// `global::Game.Foo<int>[]?` becomes `Game.Foo`.
pub fn normalize_type_name(written: &str) -> &str {
    let name = written.trim();
    let name = name.strip_prefix("global::").unwrap_or(name);
    let end = name
        .find(|c: char| c == '<' || c == '[' || c == '?' || c.is_whitespace())
        .unwrap_or(name.len());
    &name[..end]
}

/// Element type of arrays and single-argument collections; other types are
/// returned unchanged.
pub fn element_type_name(declared: &str) -> &str {
    let declared = declared.trim();
    if let Some(stripped) = declared.strip_suffix("[]") {
        return element_type_name(stripped);
    }

    let base = normalize_type_name(declared);
    let simple = base.rsplit('.').next().unwrap_or(base);
    if COLLECTION_TYPES.contains(&simple) {
        if let (Some(open), Some(close)) = (declared.find('<'), declared.rfind('>')) {
            let inner = &declared[open + 1..close];
            if !inner.contains(',') {
                return element_type_name(inner);
            }
        }
    }
    declared
}

#[derive(Debug, Clone)]
pub struct IndexStats {
    pub total_units: usize,
    pub unique_names: usize,
    pub total_enums: usize,
    pub namespaces: usize,
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Symbol Index Stats:\n\
             - Units: {} ({} lookup names)\n\
             - Enums: {}\n\
             - Namespaces: {}",
            self.total_units, self.unique_names, self.total_enums, self.namespaces
        )
    }
}
