use super::fixtures::*;
use crate::analyzer::{FrameworkPatterns, SymbolIndex};
use crate::parser::{CSharpParser, DependencyEdge, DependencyExtractor, DependencyKind};

fn extract(sources: &[(&str, &str)]) -> Vec<DependencyEdge> {
    let parser = CSharpParser::new().expect("Failed to create parser");
    let mut units = Vec::new();
    let mut enums = Vec::new();
    for (path, source) in sources {
        let parsed = parser.parse_source(source, path);
        units.extend(parsed.units);
        enums.extend(parsed.enums);
    }
    let index = SymbolIndex::build(units, enums);
    let patterns = FrameworkPatterns::default();
    DependencyExtractor::new(&index, &patterns)
        .expect("Failed to create extractor")
        .extract_all()
}

fn targets<'e>(edges: &'e [DependencyEdge], source: &str, kind: DependencyKind) -> Vec<&'e str> {
    edges
        .iter()
        .filter(|e| e.source == source && e.kind == kind)
        .map(|e| e.target.as_str())
        .collect()
}

/// Test cross-file references between the gameplay fixtures
#[test]
pub fn test_reference_parsing() {
    let edges = extract(&[
        ("Combat/Health.cs", HEALTH),
        ("Enemies/EnemyAI.cs", ENEMY_AI),
    ]);

    let enemy = "Game.Enemies.EnemyAI";
    assert_eq!(
        targets(&edges, enemy, DependencyKind::RequireComponent),
        vec!["NavMeshAgent"]
    );
    assert_eq!(
        targets(&edges, enemy, DependencyKind::Lookup),
        vec!["NavMeshAgent", "Game.Combat.Health"]
    );
    assert_eq!(
        targets(&edges, enemy, DependencyKind::Composition),
        vec!["Game.Combat.Health"]
    );
    assert_eq!(
        targets(&edges, enemy, DependencyKind::EventSubscribe),
        vec!["Game.Combat.Health"]
    );

    let subscription = edges
        .iter()
        .find(|e| e.kind == DependencyKind::EventSubscribe)
        .unwrap();
    assert_eq!(subscription.context, "health.OnDied += HandleDeath;");
    assert!(subscription.resolved);

    let unresolved: Vec<&DependencyEdge> = edges.iter().filter(|e| !e.resolved).collect();
    assert_eq!(unresolved.len(), 2);
    assert!(unresolved.iter().all(|e| e.target == "NavMeshAgent"));

    // Health only raises events
    assert!(edges.iter().all(|e| e.source == enemy));
}

#[test]
fn test_singleton_and_listener_references() {
    let edges = extract(&[
        ("Core/GameManager.cs", GAME_MANAGER),
        ("UI/ScoreDisplay.cs", SCORE_DISPLAY),
    ]);
    let display = "Game.UI.ScoreDisplay";

    assert_eq!(
        targets(&edges, display, DependencyKind::SingletonAccess),
        vec!["Game.Core.GameManager", "Game.Core.GameManager"],
        "one edge per accessing line"
    );
    assert_eq!(
        targets(&edges, display, DependencyKind::EventSubscribe),
        vec!["Game.Core.GameManager", "Button", "Game.Core.GameManager", "Button"]
    );

    let listener = edges
        .iter()
        .find(|e| e.target == "Button")
        .expect("Should record AddListener subscription");
    assert!(!listener.resolved);
    assert_eq!(listener.context, "restartButton.onClick.AddListener(Restart);");

    // Self access inside GameManager is not an edge
    assert!(edges.iter().all(|e| e.source == display));
}

#[test]
fn test_edges_are_sorted_and_unique() {
    let edges = extract(&[
        ("Core/GameManager.cs", GAME_MANAGER),
        ("UI/ScoreDisplay.cs", SCORE_DISPLAY),
        ("Combat/Health.cs", HEALTH),
        ("Enemies/EnemyAI.cs", ENEMY_AI),
    ]);

    for pair in edges.windows(2) {
        let a = (&pair[0].source, &pair[0].source_file, pair[0].line, pair[0].kind, &pair[0].target);
        let b = (&pair[1].source, &pair[1].source_file, pair[1].line, pair[1].kind, &pair[1].target);
        assert!(a < b, "edges out of order or duplicated: {:?} / {:?}", pair[0], pair[1]);
    }
}
