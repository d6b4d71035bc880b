use std::collections::HashSet;

use anyhow::Result;
use tree_sitter::{Language, Node, Parser};

use crate::parser::symbols::{
    EnumDecl, LocalDecl, MemberDecl, MemberKind, MethodDecl, MethodKind, ParsedFile, SourceUnit,
};

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "readonly", "const", "volatile",
    "new", "event", "unsafe", "fixed", "extern", "override", "virtual", "abstract", "sealed",
    "async", "partial", "required",
];

const ACCESSOR_KEYWORDS: &[&str] = &["get", "set", "init", "add", "remove"];

const SERIALIZATION_MARKERS: &[&str] = &["SerializeField", "SerializeReference"];

const LITERAL_KINDS: &[&str] = &[
    "string_literal",
    "verbatim_string_literal",
    "raw_string_literal",
    "interpolated_string_expression",
    "character_literal",
];

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "record_declaration",
    "record_struct_declaration",
    "enum_declaration",
];

/// C# source parser backed by the tree-sitter C# grammar.
///
/// Every method body is also exported as a masked copy in which comment and
/// literal contents are blanked. Byte offsets are identical between the raw
/// and masked text, so pattern matches on the masked body map back to lines.
pub struct CSharpParser {
    language: Language,
}

impl CSharpParser {
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_c_sharp::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| anyhow::anyhow!("Failed to set language: {}", e))?;
        Ok(Self { language })
    }

    /// Parses one file. Syntax errors never abort: a class containing one is
    /// dropped and reported in `problems`, everything else is kept.
    pub fn parse_source(&self, source: &str, file_path: &str) -> ParsedFile {
        let mut parsed = ParsedFile {
            file_path: file_path.to_string(),
            ..Default::default()
        };

        // `Parser` is not `Sync`, one per call keeps `&self` shareable across workers.
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&self.language) {
            parsed.problems.push(format!("failed to set language: {}", e));
            return parsed;
        }
        let Some(tree) = parser.parse(source, None) else {
            parsed.problems.push("parser produced no syntax tree".to_string());
            return parsed;
        };
        let root = tree.root_node();

        let masked = mask_source(source, root);
        let broken = syntax_problems(root, source, &mut parsed.problems);
        parsed.namespace = namespace_of(root, source);

        let mut walker = UnitWalker {
            raw: source,
            masked: &masked,
            file_path,
            namespace: parsed.namespace.clone(),
            broken: &broken,
            scope: Vec::new(),
            units: Vec::new(),
            enums: Vec::new(),
            delegates: Vec::new(),
        };
        walker.visit(root, None);

        parsed.units = walker.units;
        parsed.enums = walker.enums;
        parsed.delegates = walker.delegates;
        for unit in &mut parsed.units {
            unit.mark_delegate_members(&parsed.delegates);
        }
        parsed
    }
}

struct UnitWalker<'a> {
    raw: &'a str,
    masked: &'a str,
    file_path: &'a str,
    namespace: String,
    broken: &'a HashSet<usize>,
    /// Names of the enclosing type declarations, outermost first.
    scope: Vec<String>,
    units: Vec<SourceUnit>,
    enums: Vec<EnumDecl>,
    delegates: Vec<String>,
}

impl<'a> UnitWalker<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node_text(node, self.raw)
    }

    fn name_of(&self, node: Node<'_>) -> Option<String> {
        name_node(node).map(|n| self.text(n).to_string())
    }

    fn qualify(&self, name: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.namespace.is_empty() {
            parts.push(&self.namespace);
        }
        parts.extend(self.scope.iter().map(String::as_str));
        parts.push(name);
        parts.join(".")
    }

    /// Walks namespace and type bodies looking for declarations.
    /// `owner` is the unit whose body is being walked, if any.
    fn visit(&mut self, node: Node<'_>, owner: Option<usize>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "class_declaration" => self.visit_class(child),
                "enum_declaration" => self.visit_enum(child, owner),
                "delegate_declaration" => {
                    if let Some(name) = self.name_of(child) {
                        self.delegates.push(name);
                    }
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    let Some(name) = self.name_of(child) else {
                        continue;
                    };
                    if let Some(body) = declaration_body(child) {
                        self.scope.push(name);
                        self.visit(body, None);
                        self.scope.pop();
                    }
                }
                kind if is_container(kind) => self.visit(child, owner),
                _ => {}
            }
        }
    }

    fn visit_class(&mut self, node: Node<'_>) {
        let Some(ident) = name_node(node) else {
            return;
        };
        if self.broken.contains(&node.start_byte()) {
            return;
        }
        let name = self.text(ident).to_string();
        let body = declaration_body(node);

        let mut unit = SourceUnit {
            qualified_name: self.qualify(&name),
            name: name.clone(),
            namespace: self.namespace.clone(),
            file_path: self.file_path.to_string(),
            base_type: self.base_type_of(node),
            attributes: self.attributes_of(node),
            members: Vec::new(),
            methods: Vec::new(),
            enums: Vec::new(),
            line_start: line_of(ident),
            line_end: node.end_position().row + 1,
        };
        if let Some(body) = body {
            self.scan_members(body, &name, &mut unit);
        }

        let idx = self.units.len();
        self.units.push(unit);

        if let Some(body) = body {
            self.scope.push(name);
            self.visit(body, Some(idx));
            self.scope.pop();
        }
    }

    fn visit_enum(&mut self, node: Node<'_>, owner: Option<usize>) {
        let Some(name) = self.name_of(node) else {
            return;
        };
        let mut values = Vec::new();
        if let Some(body) = declaration_body(node) {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                if member.kind() == "enum_member_declaration" {
                    if let Some(value) = self.name_of(member) {
                        values.push(value);
                    }
                }
            }
        }

        let decl = EnumDecl {
            qualified_name: self.qualify(&name),
            name,
            values,
            line: name_node(node).map(line_of).unwrap_or_else(|| line_of(node)),
        };
        match owner.and_then(|idx| self.units.get_mut(idx)) {
            Some(unit) => unit.enums.push(decl),
            None => self.enums.push(decl),
        }
    }

    fn base_type_of(&self, node: Node<'_>) -> Option<String> {
        let bases = find_child(node, "base_list")?;
        let mut cursor = bases.walk();
        let first = bases
            .named_children(&mut cursor)
            .find(|n| n.kind() != "comment")?;
        let base = collapse_ws(self.text(first));
        if base.is_empty() { None } else { Some(base) }
    }

    fn attributes_of(&self, node: Node<'_>) -> Vec<String> {
        let mut attributes = Vec::new();
        let mut cursor = node.walk();
        for list in node.children(&mut cursor).filter(|c| c.kind() == "attribute_list") {
            let mut inner = list.walk();
            for attribute in list.named_children(&mut inner) {
                if attribute.kind() == "attribute" {
                    attributes.push(self.text(attribute).trim().to_string());
                }
            }
        }
        attributes
    }

    fn modifiers_of(&self, node: Node<'_>) -> Vec<&'a str> {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .filter_map(|c| match c.kind() {
                "modifier" => Some(self.text(c).trim()),
                kind if !c.is_named() && MODIFIERS.contains(&kind) => Some(kind),
                _ => None,
            })
            .collect()
    }

    fn type_of(&self, node: Node<'_>) -> String {
        node.child_by_field_name("type")
            .map(|t| collapse_ws(self.text(t)))
            .unwrap_or_default()
    }

    fn scan_members(&self, body: Node<'_>, owner: &str, unit: &mut SourceUnit) {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "field_declaration" => self.field_members(child, MemberKind::Field, unit),
                "event_field_declaration" => self.field_members(child, MemberKind::Event, unit),
                "property_declaration" => self.property_member(child, MemberKind::Property, unit),
                "event_declaration" => self.property_member(child, MemberKind::Event, unit),
                "indexer_declaration" => {
                    let is_static = self.modifiers_of(child).contains(&"static");
                    let value_type = self.type_of(child);
                    self.accessors(child, "this", &value_type, is_static, unit);
                }
                "method_declaration" | "operator_declaration" | "conversion_operator_declaration" => {
                    let name = match child.kind() {
                        "method_declaration" => self.name_of(child),
                        _ => Some("operator".to_string()),
                    };
                    if let Some(name) = name {
                        self.push_method(child, name, MethodKind::Method, unit);
                    }
                }
                "constructor_declaration" => {
                    let name = self.name_of(child).unwrap_or_else(|| owner.to_string());
                    self.push_method(child, name, MethodKind::Constructor, unit);
                }
                "destructor_declaration" => {
                    let name = self.name_of(child).unwrap_or_else(|| owner.to_string());
                    self.push_method(child, format!("~{}", name), MethodKind::Constructor, unit);
                }
                kind if kind.starts_with("preproc") => self.scan_members(child, owner, unit),
                _ => {}
            }
        }
    }

    fn field_members(&self, node: Node<'_>, kind: MemberKind, unit: &mut SourceUnit) {
        let Some(declaration) = find_child(node, "variable_declaration") else {
            return;
        };
        let declared_type = self.type_of(declaration);
        let modifiers = self.modifiers_of(node);
        let attributes = self.attributes_of(node);

        let mut cursor = declaration.walk();
        for declarator in declaration.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            if let Some(name) = self.name_of(declarator) {
                unit.members.push(member_decl(
                    name,
                    declared_type.clone(),
                    kind,
                    &modifiers,
                    attributes.clone(),
                    header_line(node),
                ));
            }
        }
    }

    /// Properties and accessor-style events, with their accessor bodies.
    fn property_member(&self, node: Node<'_>, kind: MemberKind, unit: &mut SourceUnit) {
        let Some(name) = self.name_of(node) else {
            return;
        };
        let declared_type = self.type_of(node);
        let modifiers = self.modifiers_of(node);
        let is_static = modifiers.contains(&"static");

        unit.members.push(member_decl(
            name.clone(),
            declared_type.clone(),
            kind,
            &modifiers,
            self.attributes_of(node),
            header_line(node),
        ));
        self.accessors(node, &name, &declared_type, is_static, unit);
    }

    fn accessors(&self, node: Node<'_>, owner: &str, value_type: &str, is_static: bool, unit: &mut SourceUnit) {
        let list = node
            .child_by_field_name("accessors")
            .filter(|n| n.kind() == "accessor_list")
            .or_else(|| find_child(node, "accessor_list"));

        let Some(list) = list else {
            // Expression-bodied property: `int Count => items.Count;`
            if let Some(arrow) = find_child(node, "arrow_expression_clause") {
                let locals = self.collect_locals(node);
                unit.methods.push(self.method_decl(
                    format!("get_{}", owner),
                    MethodKind::Accessor,
                    is_static,
                    node,
                    Some(arrow),
                    locals,
                ));
            }
            return;
        };

        let mut cursor = list.walk();
        for accessor in list.named_children(&mut cursor) {
            if accessor.kind() != "accessor_declaration" {
                continue;
            }
            let Some(body) = body_node(accessor) else {
                continue;
            };
            let Some(keyword) = self.accessor_keyword(accessor) else {
                continue;
            };

            let mut locals = Vec::new();
            if keyword != "get" && !value_type.is_empty() {
                locals.push(LocalDecl {
                    name: "value".to_string(),
                    declared_type: value_type.to_string(),
                });
            }
            locals.extend(self.collect_locals(accessor));
            unit.methods.push(self.method_decl(
                format!("{}_{}", keyword, owner),
                MethodKind::Accessor,
                is_static,
                accessor,
                Some(body),
                locals,
            ));
        }
    }

    fn accessor_keyword(&self, accessor: Node<'_>) -> Option<&'a str> {
        if let Some(name) = accessor.child_by_field_name("name") {
            return Some(self.text(name).trim());
        }
        let mut cursor = accessor.walk();
        let keyword = accessor
            .children(&mut cursor)
            .find(|c| ACCESSOR_KEYWORDS.contains(&c.kind()));
        keyword.map(|k| self.text(k))
    }

    fn push_method(&self, node: Node<'_>, name: String, kind: MethodKind, unit: &mut SourceUnit) {
        let is_static = self.modifiers_of(node).contains(&"static");
        let locals = self.collect_locals(node);
        unit.methods
            .push(self.method_decl(name, kind, is_static, node, body_node(node), locals));
    }

    fn method_decl(
        &self,
        name: String,
        kind: MethodKind,
        is_static: bool,
        decl: Node<'_>,
        body: Option<Node<'_>>,
        locals: Vec<LocalDecl>,
    ) -> MethodDecl {
        let (start, end, body_line) = match body {
            Some(block) if block.kind() == "block" => {
                let start = block.start_byte() + 1;
                let end = if self.text(block).ends_with('}') {
                    block.end_byte() - 1
                } else {
                    block.end_byte()
                };
                (start, end.max(start), line_of(block))
            }
            // `=> expr`, the clause node starts at the arrow
            Some(arrow) => {
                let start = (arrow.start_byte() + 2).min(arrow.end_byte());
                (start, arrow.end_byte(), line_of(arrow))
            }
            None => (decl.end_byte(), decl.end_byte(), decl.end_position().row + 1),
        };

        MethodDecl {
            name,
            kind,
            is_static,
            body: self.raw.get(start..end).unwrap_or("").to_string(),
            masked_body: self.masked.get(start..end).unwrap_or("").to_string(),
            line_start: header_line(decl),
            line_end: decl.end_position().row + 1,
            body_line,
            locals,
        }
    }

    /// Parameters and explicitly typed locals declared anywhere in `decl`.
    fn collect_locals(&self, decl: Node<'_>) -> Vec<LocalDecl> {
        let mut locals: Vec<LocalDecl> = Vec::new();
        let mut push = |name: &str, declared_type: String| {
            if declared_type.is_empty() || declared_type == "var" || locals.iter().any(|l| l.name == name) {
                return;
            }
            locals.push(LocalDecl {
                name: name.to_string(),
                declared_type,
            });
        };

        visit_preorder(decl, |node| {
            match node.kind() {
                "parameter" | "declaration_expression" | "declaration_pattern" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        push(self.text(name), self.type_of(node));
                    }
                }
                "foreach_statement" => {
                    if let Some(left) = node.child_by_field_name("left").filter(|l| l.kind() == "identifier") {
                        push(self.text(left), self.type_of(node));
                    }
                }
                "variable_declaration" => {
                    let declared_type = self.type_of(node);
                    let mut cursor = node.walk();
                    for declarator in node.named_children(&mut cursor) {
                        if declarator.kind() == "variable_declarator" {
                            if let Some(name) = self.name_of(declarator) {
                                push(&name, declared_type.clone());
                            }
                        }
                    }
                }
                _ => {}
            }
            true
        });
        locals
    }
}

fn member_decl(
    name: String,
    declared_type: String,
    kind: MemberKind,
    modifiers: &[&str],
    attributes: Vec<String>,
    line: usize,
) -> MemberDecl {
    let is_public = modifiers.contains(&"public");
    let is_static = modifiers.contains(&"static") || modifiers.contains(&"const");
    let has_attribute =
        |names: &[&str]| attributes.iter().any(|a| names.contains(&attribute_name(a)));

    let is_exposed = kind == MemberKind::Field
        && !is_static
        && !has_attribute(&["NonSerialized"])
        && (is_public || has_attribute(SERIALIZATION_MARKERS));

    MemberDecl {
        name,
        declared_type,
        kind,
        is_public,
        is_static,
        is_exposed,
        attributes,
        line,
        delegate_typed: false,
    }
}

/// Bare attribute name: `[field: UnityEngine.SerializeField]` gives `SerializeField`.
pub fn attribute_name(attribute: &str) -> &str {
    let name = attribute.split('(').next().unwrap_or(attribute);
    let name = name.rsplit(':').next().unwrap_or(name).trim();
    let name = name.rsplit('.').next().unwrap_or(name);
    name.strip_suffix("Attribute").unwrap_or(name)
}

/// Records every ERROR or MISSING node. Returns the start offsets of the
/// classes that contain one.
fn syntax_problems(root: Node<'_>, source: &str, problems: &mut Vec<String>) -> HashSet<usize> {
    let mut broken = HashSet::new();
    visit_preorder(root, |node| {
        if node.is_error() || node.is_missing() {
            match enclosing_type(node).filter(|t| t.kind() == "class_declaration") {
                Some(class) => {
                    if broken.insert(class.start_byte()) {
                        let name = name_node(class).map(|n| node_text(n, source)).unwrap_or("?");
                        problems.push(format!("syntax error in class {}", name));
                    }
                }
                None => {
                    let message = format!("syntax error at line {}", line_of(node));
                    if !problems.contains(&message) {
                        problems.push(message);
                    }
                }
            }
        }
        node.has_error()
    });
    broken
}

fn enclosing_type(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if TYPE_DECLARATIONS.contains(&parent.kind()) {
            return Some(parent);
        }
        current = parent.parent();
    }
    None
}

/// First declared namespace (block or file-scoped), or empty.
fn namespace_of(root: Node<'_>, source: &str) -> String {
    let mut namespace: Option<String> = None;
    visit_preorder(root, |node| {
        if namespace.is_some() {
            return false;
        }
        if matches!(node.kind(), "namespace_declaration" | "file_scoped_namespace_declaration") {
            namespace = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source).split_whitespace().collect());
            return false;
        }
        is_container(node.kind())
    });
    namespace.unwrap_or_default()
}

/// Copy of `source` with comments, literal contents and preprocessor lines
/// replaced by spaces. Newlines are kept, so offsets and lines line up.
fn mask_source(source: &str, root: Node<'_>) -> String {
    let mut out = source.as_bytes().to_vec();
    let mut blank = |from: usize, to: usize| {
        let to = to.min(out.len());
        for b in out.iter_mut().take(to).skip(from) {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    visit_preorder(root, |node| {
        let kind = node.kind();
        if kind == "comment" {
            blank(node.start_byte(), node.end_byte());
            false
        } else if LITERAL_KINDS.contains(&kind) {
            blank(node.start_byte() + 1, node.end_byte().saturating_sub(1));
            false
        } else {
            true
        }
    });

    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            blank(offset, offset + line.len());
        }
        offset += line.len();
    }

    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Pre-order walk; `visit` returns whether to descend into the node.
fn visit_preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> bool) {
    let mut cursor = root.walk();
    loop {
        if visit(cursor.node()) && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn is_container(kind: &str) -> bool {
    matches!(
        kind,
        "compilation_unit"
            | "namespace_declaration"
            | "file_scoped_namespace_declaration"
            | "declaration_list"
            | "ERROR"
    ) || kind.starts_with("preproc")
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

fn name_node(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("name").or_else(|| find_child(node, "identifier"))
}

fn find_child<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
    found
}

fn declaration_body(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("body")
        .filter(|b| matches!(b.kind(), "declaration_list" | "enum_member_declaration_list"))
        .or_else(|| find_child(node, "declaration_list"))
        .or_else(|| find_child(node, "enum_member_declaration_list"))
}

fn body_node(node: Node<'_>) -> Option<Node<'_>> {
    fn is_body(n: &Node<'_>) -> bool {
        matches!(n.kind(), "block" | "arrow_expression_clause")
    }
    node.child_by_field_name("body")
        .filter(is_body)
        .or_else(|| {
            let mut cursor = node.walk();
            let found = node.named_children(&mut cursor).find(is_body);
            found
        })
}

/// Line of the declaration itself, after any attribute lists.
fn header_line(node: Node<'_>) -> usize {
    let mut cursor = node.walk();
    let first = node
        .children(&mut cursor)
        .find(|c| !matches!(c.kind(), "attribute_list" | "comment"));
    first.map(line_of).unwrap_or_else(|| line_of(node))
}

fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
