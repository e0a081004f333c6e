//! Property-based tests for the directive grammar

use proptest::prelude::*;
use trellis::{Params, Query};

fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

/// Any well-formed directive prints back to text that parses to the same query
#[test]
fn test_directive_display_round_trips() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                word(),
                word(),
                prop::option::of("[a-z0-9-]{1,12}"),
                prop::collection::vec((word(), prop::option::of("[a-z0-9]{0,6}")), 0..4),
            ),
            |(module, action, target, pairs)| {
                let params: Params = pairs.into_iter().collect();
                let query = Query {
                    module,
                    action,
                    target,
                    params,
                };
                let reparsed = Query::parse(&query.to_string()).unwrap();
                assert_eq!(reparsed, query);
                Ok(())
            },
        )
        .unwrap();
}

/// Text without the `{module}/action` prefix never parses
#[test]
fn test_directive_requires_module_prefix() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[a-z/?=&]{0,20}", |text| {
            assert!(Query::parse(&text).is_err());
            Ok(())
        })
        .unwrap();
}
