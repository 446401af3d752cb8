use proptest::prelude::*;
use quadpath::store::MemStore;
use quadpath::{Path, QuadStore, Step, Via};
use std::collections::BTreeSet;
use std::sync::Arc;

const MAX_NODES: usize = 6;
const MAX_RELS: usize = 3;
const MAX_EDGES: usize = 24;
const MAX_OPS: usize = 5;

#[derive(Debug, Clone)]
enum Op {
    /// `None` means any predicate.
    Out(Option<usize>),
    In(Option<usize>),
    Is(Vec<usize>),
    Tag(usize),
    And(Vec<usize>),
    Or(Vec<usize>),
    Except(Vec<usize>),
    Follow(Vec<Op>),
}

#[derive(Debug, Clone)]
struct GraphCase {
    node_count: usize,
    edges: Vec<(usize, usize, usize)>, // (rel_idx, src_idx, dst_idx)
    ops: Vec<Op>,
    left: Vec<Op>,
    right: Vec<Op>,
    start_idx: usize,
    rel_idx: usize,
}

fn node(i: usize) -> String {
    format!("n{i}")
}

fn rel(i: usize) -> String {
    format!("r{i}")
}

fn op_strategy(node_count: usize, rel_count: usize) -> impl Strategy<Value = Op> {
    let nodes = || prop::collection::vec(0usize..node_count, 0..=3);
    let leaf = prop_oneof![
        prop::option::of(0usize..rel_count).prop_map(Op::Out),
        prop::option::of(0usize..rel_count).prop_map(Op::In),
        nodes().prop_map(Op::Is),
        (0usize..3).prop_map(Op::Tag),
        nodes().prop_map(Op::And),
        nodes().prop_map(Op::Or),
        nodes().prop_map(Op::Except),
    ];
    leaf.prop_recursive(2, 12, 3, |inner| {
        prop::collection::vec(inner, 0..=3).prop_map(Op::Follow)
    })
}

fn graph_case_strategy() -> impl Strategy<Value = GraphCase> {
    (1usize..=MAX_NODES, 1usize..=MAX_RELS).prop_flat_map(|(node_count, rel_count)| {
        (
            Just(node_count),
            prop::collection::vec(
                (0usize..rel_count, 0usize..node_count, 0usize..node_count),
                0..=MAX_EDGES,
            ),
            prop::collection::vec(op_strategy(node_count, rel_count), 0..=MAX_OPS),
            prop::collection::vec(op_strategy(node_count, rel_count), 0..=2),
            prop::collection::vec(op_strategy(node_count, rel_count), 0..=2),
            0usize..node_count,
            0usize..rel_count,
        )
    })
    .prop_map(
        |(node_count, edges, ops, left, right, start_idx, rel_idx)| GraphCase {
            node_count,
            edges,
            ops,
            left,
            right,
            start_idx,
            rel_idx,
        },
    )
}

fn build_store(case: &GraphCase) -> Arc<dyn QuadStore> {
    let store = MemStore::new();
    // Every node exists even without edges, so lookups never miss.
    for i in 0..case.node_count {
        store.add_quad(&node(i), "name", &format!("node {i}"), None).unwrap();
    }
    for (rel_idx, src_idx, dst_idx) in &case.edges {
        store.add_quad(&node(*src_idx), &rel(*rel_idx), &node(*dst_idx), None).unwrap();
    }
    Arc::new(store)
}

fn names(idx: &[usize]) -> Vec<String> {
    idx.iter().map(|i| node(*i)).collect()
}

fn build_path(mut path: Path, ops: &[Op], qs: &Arc<dyn QuadStore>) -> Path {
    for op in ops {
        path = match op {
            Op::Out(Some(r)) => path.out(rel(*r)),
            Op::Out(None) => path.out(Via::any()),
            Op::In(Some(r)) => path.in_(rel(*r)),
            Op::In(None) => path.in_(Via::any()),
            Op::Is(nodes) => path.is(names(nodes)),
            Op::Tag(t) => path.tag([format!("t{t}")]),
            Op::And(nodes) => path.and(Path::new_bound(Arc::clone(qs), names(nodes))),
            Op::Or(nodes) => path.or(Path::new_template(names(nodes))),
            Op::Except(nodes) => path.except(Path::new_template(names(nodes))),
            Op::Follow(sub) => path.follow(build_path(Path::default(), sub, qs)),
        };
    }
    path
}

/// Paths without `or` denote a relation between start and end nodes.
fn is_relational(ops: &[Op]) -> bool {
    ops.iter().all(|op| match op {
        Op::Or(_) => false,
        Op::Follow(sub) => is_relational(sub),
        _ => true,
    })
}

fn eval(path: &Path) -> BTreeSet<String> {
    let qs = path.storage().expect("bound path");
    let ids = path.build_iterator().unwrap().evaluate(qs.as_ref()).unwrap();
    qs.names(&ids).unwrap().into_iter().collect()
}

fn out_naive(case: &GraphCase, start_idx: usize, rel_idx: usize) -> BTreeSet<String> {
    case.edges
        .iter()
        .filter(|(r, src, _)| *r == rel_idx && *src == start_idx)
        .map(|(_, _, dst)| node(*dst))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn reverse_of_reverse_is_identity(case in graph_case_strategy()) {
        let qs = build_store(&case);
        let path = build_path(Path::new_bound(Arc::clone(&qs), [node(case.start_idx)]), &case.ops, &qs);
        let round_trip = path.reverse().reverse();

        prop_assert_eq!(&round_trip, &path);
        prop_assert_eq!(eval(&round_trip), eval(&path));
    }

    #[test]
    fn reverse_is_the_converse_relation(case in graph_case_strategy()) {
        prop_assume!(is_relational(&case.ops));
        let qs = build_store(&case);
        let morphism = build_path(Path::default(), &case.ops, &qs);
        let reversed = morphism.reverse();

        for a in 0..case.node_count {
            let forward = eval(&Path::new_bound(Arc::clone(&qs), [node(a)]).follow(morphism.clone()));
            for x in 0..case.node_count {
                let backward = eval(&Path::new_bound(Arc::clone(&qs), [node(x)]).follow(reversed.clone()));
                prop_assert_eq!(
                    forward.contains(&node(x)),
                    backward.contains(&node(a)),
                    "a={} x={}", a, x
                );
            }
        }
    }

    #[test]
    fn out_matches_naive(case in graph_case_strategy()) {
        let qs = build_store(&case);
        let actual = eval(&Path::new_bound(qs, [node(case.start_idx)]).out(rel(case.rel_idx)));
        prop_assert_eq!(actual, out_naive(&case, case.start_idx, case.rel_idx));
    }

    #[test]
    fn out_in_duality(case in graph_case_strategy()) {
        let qs = build_store(&case);
        let start = node(case.start_idx);
        let forward = eval(&Path::new_bound(Arc::clone(&qs), [start.clone()]).out(rel(case.rel_idx)));
        for x in &forward {
            let back = eval(&Path::new_bound(Arc::clone(&qs), [x.clone()]).in_(rel(case.rel_idx)));
            prop_assert!(back.contains(&start), "{} not reached back from {}", start, x);
        }
    }

    #[test]
    fn reverse_of_composition_is_composition_of_reverses(case in graph_case_strategy()) {
        let qs = build_store(&case);
        let a = build_path(Path::default(), &case.left, &qs);
        let b = build_path(Path::default(), &case.right, &qs);
        let ab = a.clone().follow(b.clone());

        let reversed = ab.reverse();
        prop_assert_eq!(&reversed.steps()[0], &Step::Follow(Arc::new(b.reverse())));
        let a_rev = a.reverse();
        prop_assert_eq!(&reversed.steps()[1..], a_rev.steps());

        let start = [node(case.start_idx)];
        let lhs = Path::new_bound(Arc::clone(&qs), start.clone()).follow(reversed);
        let rhs = Path::new_bound(qs, start).follow(b.reverse()).follow(a.reverse());
        prop_assert_eq!(eval(&lhs), eval(&rhs));
    }
}

#[test]
fn reverse_of_two_outs_is_two_ins_swapped() {
    let a = Path::default().out("p");
    let b = Path::default().out("q");
    let ab = Path::default().out("p").out("q");

    let reversed = ab.reverse();
    assert_eq!(
        reversed.steps(),
        &[Step::In(Via::from("q")), Step::In(Via::from("p"))]
    );

    let chained = b.reverse().follow(a.reverse());
    assert_eq!(chained.steps()[0], Step::In(Via::from("q")));
    assert_eq!(chained.steps()[1], Step::Follow(Arc::new(a.reverse())));
}
