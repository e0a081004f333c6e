//! Property-based tests for transform pipelines

use proptest::prelude::*;
use serde_json::{json, Value};
use trellis::dates::DateSettings;
use trellis::process::run_chain;

fn run(spec: Value, input: Value) -> Value {
    run_chain(&[spec], input, &DateSettings::default().context()).unwrap()
}

/// Records `{i, k}` where `i` is the original position
fn records(keys: &[i64]) -> Value {
    Value::Array(
        keys.iter()
            .enumerate()
            .map(|(i, k)| json!({"i": i, "k": k}))
            .collect(),
    )
}

fn positions(value: &Value) -> Vec<u64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["i"].as_u64().unwrap())
        .collect()
}

#[test]
fn test_limit_keeps_a_prefix() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec(0i64..100, 0..30), 0usize..40),
            |(keys, size)| {
                let output = run(json!({"action": "Limit", "size": size}), records(&keys));
                let expected: Vec<u64> = (0..keys.len().min(size) as u64).collect();
                assert_eq!(positions(&output), expected);
                Ok(())
            },
        )
        .unwrap();
}

/// Sorting is a stable permutation ordered by the key
#[test]
fn test_sort_is_stable_permutation() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec(0i64..5, 0..30), any::<bool>()),
            |(keys, descending)| {
                let order = if descending { "desc" } else { "asc" };
                let output = run(
                    json!({"action": "Sort", "fields": "k", "orders": order}),
                    records(&keys),
                );

                let mut expected: Vec<(i64, u64)> = keys
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (*k, i as u64))
                    .collect();
                expected.sort_by(|a, b| {
                    let ord = a.0.cmp(&b.0);
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
                let expected: Vec<u64> = expected.into_iter().map(|(_, i)| i).collect();
                assert_eq!(positions(&output), expected);
                Ok(())
            },
        )
        .unwrap();
}

/// One survivor per name, holding the best priority, in input order
#[test]
fn test_dedup_survivors() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec((0u8..4, 0u8..3), 0..25),
            |pairs| {
                let kinds = ["new", "updated", "other"];
                let input = Value::Array(
                    pairs
                        .iter()
                        .enumerate()
                        .map(|(i, (name, kind))| {
                            json!({"i": i, "name": format!("n{}", name), "kind": kinds[*kind as usize]})
                        })
                        .collect(),
                );
                let output = run(
                    json!({
                        "action": "RemoveDuplicates",
                        "dedupField": "name",
                        "priorityField": "kind",
                        "priorityValues": ["new", "updated"]
                    }),
                    input,
                );

                let survivors = positions(&output);
                assert!(survivors.windows(2).all(|w| w[0] < w[1]));

                let mut expected: Vec<u64> = Vec::new();
                for name in 0u8..4 {
                    let best = pairs
                        .iter()
                        .enumerate()
                        .filter(|(_, (n, _))| *n == name)
                        .min_by_key(|(i, (_, kind))| (*kind, *i));
                    if let Some((i, _)) = best {
                        expected.push(i as u64);
                    }
                }
                expected.sort_unstable();
                assert_eq!(survivors, expected);
                Ok(())
            },
        )
        .unwrap();
}

#[test]
fn test_project_is_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec(
                (prop::option::of(0i64..10), prop::option::of("[a-z]{0,4}"), any::<bool>()),
                0..10,
            ),
            |rows| {
                let input = Value::Array(
                    rows.iter()
                        .map(|(a, b, flag)| {
                            let mut record = json!({"flag": flag, "nested": {"b": b}});
                            if let Some(a) = a {
                                record["a"] = json!(a);
                            }
                            record
                        })
                        .collect(),
                );
                let spec = json!({"action": "Project", "fields": ["a", "nested.b"]});
                let once = run(spec.clone(), input);
                let twice = run(spec, once.clone());
                assert_eq!(once, twice);
                for record in once.as_array().unwrap() {
                    assert!(record.get("flag").is_none());
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Grouping never drops or duplicates a record
#[test]
fn test_group_by_date_partitions_input() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(any::<bool>(), 0..20), |labels| {
            let input = Value::Array(
                labels
                    .iter()
                    .enumerate()
                    .map(|(i, labeled)| {
                        if *labeled {
                            json!({"i": i, "date": format!("day {}", i)})
                        } else {
                            json!({"i": i})
                        }
                    })
                    .collect(),
            );
            let output = run(json!("GroupByDate"), input);
            let groups = output.as_array().unwrap();

            let flattened: Vec<u64> = groups
                .iter()
                .flat_map(|g| positions(&g["items"]))
                .collect();
            assert_eq!(flattened, (0..labels.len() as u64).collect::<Vec<_>>());

            let labeled = labels.iter().filter(|l| **l).count();
            let leading = usize::from(labels.first() == Some(&false));
            assert_eq!(groups.len(), labeled + leading);
            Ok(())
        })
        .unwrap();
}
