// Parser regression tests based on common Unity script layouts
// These tests ensure we don't break existing scanning behaviour

pub mod fixtures;

mod reference_parsing;

pub use class_parsing::test_class_parsing;
pub use member_parsing::test_member_parsing;
pub use reference_parsing::test_reference_parsing;

/// Run all parser regression tests
pub fn run_all_parser_tests() {
    println!("Running parser regression tests...");

    test_class_parsing();
    test_member_parsing();
    test_reference_parsing();

    println!("All parser regression tests passed!");
}

#[test]
fn test_run_all_parser_tests() {
    run_all_parser_tests();
}
