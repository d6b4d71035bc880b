use serde::{Deserialize, Serialize};

/// One class declaration isolated from a source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    pub qualified_name: String,
    pub name: String,
    pub namespace: String,
    pub file_path: String,
    pub base_type: Option<String>,
    pub attributes: Vec<String>,
    pub members: Vec<MemberDecl>,
    pub methods: Vec<MethodDecl>,
    pub enums: Vec<EnumDecl>,
    pub line_start: usize,
    pub line_end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    pub declared_type: String,
    pub kind: MemberKind,
    pub is_public: bool,
    pub is_static: bool,
    /// Public field or field carrying a serialization marker.
    pub is_exposed: bool,
    pub attributes: Vec<String>,
    pub line: usize,
    /// Declared type is a `delegate` declared somewhere in the project.
    #[serde(default)]
    pub delegate_typed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Property,
    Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    pub is_static: bool,
    /// Body text as written, without the enclosing braces.
    pub body: String,
    /// Body with comment and literal contents blanked out.
    pub masked_body: String,
    pub line_start: usize,
    pub line_end: usize,
    /// Line on which `body` begins.
    pub body_line: usize,
    /// Parameters and explicitly typed locals, in declaration order.
    #[serde(default)]
    pub locals: Vec<LocalDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDecl {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Method,
    Constructor,
    /// Property getter/setter or event add/remove block.
    Accessor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub qualified_name: String,
    pub values: Vec<String>,
    pub line: usize,
}

/// Everything extracted from a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedFile {
    pub file_path: String,
    pub namespace: String,
    pub units: Vec<SourceUnit>,
    /// Enums declared at namespace level.
    pub enums: Vec<EnumDecl>,
    /// Names of `delegate` types declared in the file.
    pub delegates: Vec<String>,
    pub problems: Vec<String>,
}

impl SourceUnit {
    pub fn member(&self, name: &str) -> Option<&MemberDecl> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &MemberDecl> {
        self.members.iter().filter(|m| m.kind == MemberKind::Field)
    }

    pub fn event_like_members(&self) -> impl Iterator<Item = &MemberDecl> {
        self.members.iter().filter(|m| m.is_event_like())
    }

    pub fn declares_event(&self, name: &str) -> bool {
        self.member(name).map(|m| m.is_event_like()).unwrap_or(false)
    }

    pub fn nested_enum(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Flags members whose declared type is one of `delegates`.
    pub fn mark_delegate_members(&mut self, delegates: &[String]) {
        if delegates.is_empty() {
            return;
        }
        for member in &mut self.members {
            if !member.delegate_typed {
                let base = member.type_base_name();
                member.delegate_typed = delegates.iter().any(|d| d == base);
            }
        }
    }
}

impl MethodDecl {
    pub fn local(&self, name: &str) -> Option<&LocalDecl> {
        self.locals.iter().find(|l| l.name == name)
    }
}

const DELEGATE_TYPES: &[&str] = &["Action", "Func", "UnityEvent", "EventHandler"];

impl MemberDecl {
    /// `event` members and fields or properties of a delegate/event type.
    pub fn is_event_like(&self) -> bool {
        self.kind == MemberKind::Event
            || self.delegate_typed
            || DELEGATE_TYPES.contains(&self.type_base_name())
    }

    /// Declared type without generic arguments or namespace.
    pub fn type_base_name(&self) -> &str {
        self.declared_type
            .split('<')
            .next()
            .unwrap_or("")
            .rsplit('.')
            .next()
            .unwrap_or("")
            .trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, ty: &str, kind: MemberKind) -> MemberDecl {
        MemberDecl {
            name: name.to_string(),
            declared_type: ty.to_string(),
            kind,
            is_public: true,
            is_static: false,
            is_exposed: kind == MemberKind::Field,
            attributes: Vec::new(),
            line: 1,
            delegate_typed: false,
        }
    }

    #[test]
    fn test_event_like_members() {
        assert!(member("OnDied", "Action", MemberKind::Event).is_event_like());
        assert!(member("OnScore", "System.Action<int>", MemberKind::Field).is_event_like());
        assert!(member("onClick", "UnityEvent", MemberKind::Field).is_event_like());
        assert!(!member("speed", "float", MemberKind::Field).is_event_like());
        assert!(!member("Actions", "List<Action>", MemberKind::Field).is_event_like());
    }

    #[test]
    fn test_user_delegate_members_are_event_like() {
        let mut changed = member("onChanged", "ValueChanged", MemberKind::Field);
        assert!(!changed.is_event_like());
        changed.delegate_typed = true;
        assert!(changed.is_event_like());
        assert_eq!(member("x", "Game.Events.Handler<int>", MemberKind::Field).type_base_name(), "Handler");
    }
}
