//! Property-based invariant tests for the scene graph.
//!
//! Random sequences of topology, mounting, visibility and size operations are
//! applied to a fresh context. After every step:
//!
//! 1. Parent links never form a cycle and always terminate.
//! 2. Parent and child links agree with each other.
//! 3. The dispatcher's identities are exactly the mounted nodes reachable from the root.
//! 4. A mounted node's identity is its parent's identity plus its slot.
//! 5. The renderer saw `MOUNT`/`DISMOUNT` pairs that leave it with the same identity set.
//! 6. A resolved relative axis is the parent's resolved extent times the fraction.

use std::collections::BTreeSet;

use proptest::prelude::*;
use scenery_core::{
    Axis, Command, CommandQueue, Context, Event, NodeId, NodePath, Resolution, SizeMode,
};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Create,
    Add(usize, usize),
    Remove(usize, usize),
    Mount(usize),
    Unmount(usize),
    Show(usize),
    Hide(usize),
    Relative(usize, f32),
    Absolute(usize, f32),
    Resize(f32, f32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Create),
        4 => (any::<usize>(), any::<usize>()).prop_map(|(p, c)| Op::Add(p, c)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(p, c)| Op::Remove(p, c)),
        1 => any::<usize>().prop_map(Op::Mount),
        1 => any::<usize>().prop_map(Op::Unmount),
        1 => any::<usize>().prop_map(Op::Show),
        1 => any::<usize>().prop_map(Op::Hide),
        1 => (any::<usize>(), 0u8..=8).prop_map(|(n, f)| Op::Relative(n, f32::from(f) / 4.0)),
        1 => (any::<usize>(), 0u16..=2000).prop_map(|(n, v)| Op::Absolute(n, f32::from(v))),
        1 => (0u16..=4000, 0u16..=4000).prop_map(|(x, y)| Op::Resize(f32::from(x), f32::from(y))),
    ]
}

fn pick(nodes: &[NodeId], index: usize) -> NodeId {
    nodes[index % nodes.len()]
}

/// Applies one operation. Rejected operations are expected and ignored.
fn apply(context: &mut Context, nodes: &mut Vec<NodeId>, op: &Op) {
    let _ = match *op {
        Op::Create => {
            nodes.push(context.scene().create_node());
            Ok(())
        }
        Op::Add(p, c) => context.scene().add_child(pick(nodes, p), pick(nodes, c)),
        Op::Remove(p, c) => context.scene().remove_child(pick(nodes, p), pick(nodes, c)),
        Op::Mount(n) => context.scene().mount(pick(nodes, n)),
        Op::Unmount(n) => {
            let id = pick(nodes, n);
            if id == context.root() {
                Ok(())
            } else {
                context.scene().unmount(id)
            }
        }
        Op::Show(n) => context.scene().show(pick(nodes, n)),
        Op::Hide(n) => context.scene().hide(pick(nodes, n)),
        Op::Relative(n, fraction) => {
            context
                .scene()
                .set_relative_size(pick(nodes, n), fraction, fraction, 1.0)
        }
        Op::Absolute(n, value) => {
            let id = pick(nodes, n);
            let mut scene = context.scene();
            scene
                .set_absolute_size(id, value, value, 0.0)
                .and_then(|()| {
                    scene.set_size_mode(id, SizeMode::Absolute, SizeMode::Relative, SizeMode::Relative)
                })
        }
        Op::Resize(x, y) => context.receive(Event::context_resize(x, y, 0.0)),
    };
}

/// Replays the command stream into the identity set the renderer believes is mounted.
fn renderer_view(commands: &[Command], seen: &mut BTreeSet<NodePath>) -> Result<(), String> {
    for command in commands {
        match command {
            Command::Mount { path } => {
                if !seen.insert(path.clone()) {
                    return Err(format!("MOUNT for already mounted {path}"));
                }
            }
            Command::Dismount { path } => {
                if !seen.remove(path) {
                    return Err(format!("DISMOUNT for unknown {path}"));
                }
            }
            other => {
                if let Some(path) = other.path() {
                    if !seen.contains(path) {
                        return Err(format!("{} for unmounted {path}", other.name()));
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_invariants(context: &mut Context, nodes: &[NodeId]) -> Result<(), TestCaseError> {
    let tree = context.tree();
    let root = context.root();

    for &id in nodes {
        // 1. Bounded, acyclic ancestry.
        let depth = tree.ancestors(id).take(nodes.len() + 1).count();
        prop_assert!(depth <= nodes.len(), "ancestry of {:?} does not terminate", id);
        prop_assert!(!tree.is_ancestor(id, id), "{:?} is its own ancestor", id);

        // 2. Link agreement.
        if let Some(parent) = tree.parent(id) {
            let hits = tree.children(parent).iter().filter(|c| **c == id).count();
            prop_assert_eq!(hits, 1, "{:?} listed {} times under {:?}", id, hits, parent);
        }
        for child in tree.children(id) {
            prop_assert_eq!(tree.parent(*child), Some(id));
        }
    }
    prop_assert_eq!(tree.parent(root), None);

    // 3. Registry matches mounted reachable nodes.
    let mounted: BTreeSet<(NodePath, NodeId)> = nodes
        .iter()
        .filter_map(|&id| tree.get(id).ok()?.path().cloned().map(|path| (path, id)))
        .collect();
    let registered: BTreeSet<(NodePath, NodeId)> = context
        .dispatcher()
        .registered()
        .map(|(path, id)| (path.clone(), id))
        .collect();
    prop_assert_eq!(&mounted, &registered);
    for (_, id) in &mounted {
        prop_assert!(tree.is_reachable(*id), "{:?} mounted but unreachable", id);
    }

    // 4. Identity derivation.
    for (path, id) in &mounted {
        if let (Some(parent), Some(slot)) = (tree.parent(*id), tree.slot(*id)) {
            let parent_path = tree.get(parent).ok().and_then(|node| node.path().cloned());
            prop_assert_eq!(parent_path.map(|p| p.child(slot)), Some(path.clone()));
        }
    }

    // 6. Relative scaling.
    let mut scene = context.scene();
    for &id in nodes {
        let Some(parent) = scene.tree().parent(id) else {
            continue;
        };
        let axis = scene.node(id).ok().map(|node| *node.size().axis(Axis::X));
        let Some(axis) = axis.filter(|axis| axis.mode == SizeMode::Relative) else {
            continue;
        };
        let own = scene.size(id).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let inherited = scene
            .size(parent)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        match (own[0], inherited[0]) {
            (Resolution::Resolved(value), Resolution::Resolved(base)) => {
                prop_assert!((value - base * axis.fraction).abs() < 1e-3);
            }
            (Resolution::Pending, Resolution::Pending) => {}
            other => prop_assert!(false, "relative axis disagrees with parent: {:?}", other),
        }
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// Random operation sequences keep the graph consistent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_operations_keep_invariants(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let queue = CommandQueue::new();
        let mut context = Context::new("#app", queue.clone());
        let mut nodes = vec![context.root()];
        let mut seen = BTreeSet::new();

        for op in &ops {
            apply(&mut context, &mut nodes, op);
            check_invariants(&mut context, &nodes)?;

            // 5. Renderer view matches the registry.
            renderer_view(&queue.drain(), &mut seen).map_err(TestCaseError::fail)?;
            let registered: BTreeSet<NodePath> = context
                .dispatcher()
                .registered()
                .map(|(path, _)| path.clone())
                .collect();
            prop_assert_eq!(&seen, &registered, "after {:?}", op);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Emitted sizes never repeat and never carry pending axes
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn size_commands_are_deduplicated(
        sizes in prop::collection::vec((0u16..=50, 0u16..=50), 1..32)
    ) {
        let queue = CommandQueue::new();
        let mut context = Context::new("#app", queue.clone());
        let root = context.root();
        let child = context.scene().create_node();
        context.scene().add_child(root, child).unwrap();
        let _ = queue.drain();

        let mut last = None;
        for (x, y) in sizes {
            let size = [f32::from(x), f32::from(y), 0.0];
            context.receive(Event::context_resize(size[0], size[1], 0.0)).unwrap();
            let commands = queue.drain();
            if last == Some(size) {
                prop_assert!(commands.is_empty(), "repeated size re-emitted: {:?}", commands);
            } else {
                prop_assert_eq!(commands.len(), 2);
                for command in &commands {
                    prop_assert_eq!(command, &Command::SizeAbsolute {
                        path: command.path().cloned().unwrap(),
                        size,
                    });
                }
            }
            last = Some(size);
        }
    }
}
