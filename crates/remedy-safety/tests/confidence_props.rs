use proptest::prelude::*;
use remedy_model::{FixComplexity, ProblemClass};
use remedy_safety::confidence::{class_penalty, complexity_penalty, files_penalty};
use remedy_safety::{assess, calculate_confidence, requires_human_review};

fn any_class() -> impl Strategy<Value = ProblemClass> {
    prop::sample::select(ProblemClass::ALL.to_vec())
}

fn any_complexity() -> impl Strategy<Value = FixComplexity> {
    prop::sample::select(FixComplexity::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_score_is_bounded(class in any_class(), complexity in any_complexity(), files in any::<u32>()) {
        let score = calculate_confidence(class, complexity, files);
        prop_assert!(score <= 100);
    }

    #[test]
    fn prop_score_matches_penalty_table(class in any_class(), complexity in any_complexity(), files in 0u32..100) {
        let expected = 100 - class_penalty(class) - complexity_penalty(complexity) - (files * 5).min(30);
        prop_assert_eq!(u32::from(calculate_confidence(class, complexity, files)), expected);
    }

    #[test]
    fn prop_review_flag_is_exact(class in any_class(), complexity in any_complexity(), files in 0u32..20) {
        let a = assess(class, complexity, files);
        prop_assert_eq!(a.requires_human_review, a.confidence_score < 70 || files > 3);
    }

    #[test]
    fn prop_more_files_never_raise_confidence(class in any_class(), complexity in any_complexity(), files in 0u32..50) {
        prop_assert!(
            calculate_confidence(class, complexity, files + 1) <= calculate_confidence(class, complexity, files)
        );
    }
}

#[test]
fn test_review_boundary_at_score_seventy() {
    assert!(!requires_human_review(70, 1));
    assert!(requires_human_review(69, 1));
}

#[test]
fn test_review_boundary_at_three_files() {
    assert!(!requires_human_review(95, 3));
    assert!(requires_human_review(95, 4));
}

#[test]
fn test_exact_seventy_is_not_reviewed() {
    // logic(15) + simple(0) + 3 files(15)
    let a = assess(ProblemClass::Logic, FixComplexity::Simple, 3);
    assert_eq!(a.confidence_score, 70);
    assert!(!a.requires_human_review);
}

#[test]
fn test_worst_case_floor() {
    // security(25) + complex(25) + capped files(30)
    assert_eq!(calculate_confidence(ProblemClass::Security, FixComplexity::Complex, 1_000), 20);
    assert_eq!(files_penalty(7), 30);
}

#[test]
fn test_penalty_table() {
    let table = [
        (ProblemClass::Syntax, 5),
        (ProblemClass::Logic, 15),
        (ProblemClass::Security, 25),
        (ProblemClass::Performance, 10),
        (ProblemClass::Other, 20),
    ];
    for (class, penalty) in table {
        assert_eq!(class_penalty(class), penalty);
    }
    assert_eq!(complexity_penalty(FixComplexity::Simple), 0);
    assert_eq!(complexity_penalty(FixComplexity::Medium), 10);
    assert_eq!(complexity_penalty(FixComplexity::Complex), 25);
}
