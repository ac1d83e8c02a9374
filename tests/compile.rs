//! Forward-pass behavior: linking, validation, compile status, and the
//! runtime node-entry contract.

use dtgc::{
    compile, CompileStatus, Dialogue, DialogueEvent, DialogueGraph, DialogueQuery, EnterOutcome,
    GraphCondition, NodeData, NodeId, NodePayload, Position,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Entry -> Branch -> [true: "Hello", false: "Goodbye"], with the branch
/// condition left unbound so the first compile fails.
fn branch_fixture() -> (DialogueGraph, NodeId, NodeId, NodeId) {
    let mut graph = DialogueGraph::new("branch-test");
    graph.add_speaker("npc");
    let root = graph.root().unwrap().clone();

    let branch = graph.add_node(
        NodeData::branch(false, vec![GraphCondition::new()]),
        Position::new(100.0, 0.0),
    );
    let hello = graph.add_node(NodeData::speech("npc", "Hello"), Position::new(200.0, -50.0));
    let goodbye = graph.add_node(NodeData::speech("npc", "Goodbye"), Position::new(200.0, 50.0));

    graph.connect(&root, 0, &branch);
    graph.connect(&branch, 0, &hello);
    graph.connect(&branch, 1, &goodbye);

    (graph, branch, hello, goodbye)
}

#[test]
fn compiled_node_ids_are_unique() {
    let (mut graph, ..) = branch_fixture();
    let mut asset = Dialogue::new("branch-test");
    compile(&mut graph, &mut asset).unwrap();

    let mut ids: Vec<_> = asset.nodes().iter().map(|n| n.id().clone()).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn links_are_symmetric_in_both_directions() {
    let (mut graph, ..) = branch_fixture();
    let mut asset = Dialogue::new("branch-test");
    compile(&mut graph, &mut asset).unwrap();

    for node in asset.nodes() {
        for child in node.children() {
            let child_node = asset.node(child).expect("child exists");
            assert!(
                child_node.parents().contains(node.id()),
                "{} -> {} missing the back edge",
                node.id(),
                child
            );
        }
        for parent in node.parents() {
            let parent_node = asset.node(parent).expect("parent exists");
            assert!(parent_node.children().contains(node.id()));
        }
    }
}

#[test]
fn unbound_condition_fails_compile_with_only_the_branch_flagged() {
    init_tracing();
    let (mut graph, branch, hello, goodbye) = branch_fixture();
    let mut asset = Dialogue::new("branch-test");

    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Failed);
    assert_eq!(asset.status(), CompileStatus::Failed);

    for node in graph.registry().all() {
        assert_eq!(node.error(), node.id() == &branch, "flag on {}", node.id());
    }

    // Bind a valid boolean query and recompile.
    if let Some(node) = graph.registry_mut().lookup_mut(&branch) {
        if let NodeData::Branch(data) = node.data_mut() {
            data.conditions[0].set_query(DialogueQuery::Flag {
                name: "flag_x".into(),
            });
        }
    }

    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Compiled);
    assert!(!graph.registry().lookup(&branch).unwrap().error());

    match asset.node(&branch).unwrap().payload() {
        NodePayload::Branch {
            true_target,
            false_target,
            conditions,
            ..
        } => {
            assert_eq!(true_target.as_ref(), Some(&hello));
            assert_eq!(false_target.as_ref(), Some(&goodbye));
            assert_eq!(conditions.len(), 1);
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn failed_compile_keeps_a_slot_per_condition_binding() {
    let mut graph = DialogueGraph::new("slots-test");
    graph.add_speaker("npc");
    let root = graph.root().unwrap().clone();

    let bound = GraphCondition::with_query(DialogueQuery::Flag {
        name: "flag_x".into(),
    });
    let branch = graph.add_node(
        NodeData::branch(false, vec![GraphCondition::new(), bound]),
        Position::new(100.0, 0.0),
    );
    graph.connect(&root, 0, &branch);

    let mut asset = Dialogue::new("slots-test");
    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Failed);

    match asset.node(&branch).unwrap().payload() {
        NodePayload::Branch { conditions, .. } => {
            assert_eq!(conditions.len(), 2);
            assert!(conditions[0].is_none());
            assert!(conditions[1].is_some());
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn event_targeting_deleted_node_fails_validation() {
    let mut graph = DialogueGraph::new("event-test");
    graph.add_speaker("npc");
    let root = graph.root().unwrap().clone();
    let target = graph.add_node(NodeData::speech("npc", "hi"), Position::new(100.0, 100.0));
    let event = graph.add_node(
        NodeData::event(vec![DialogueEvent::reset_node_visits(target.clone())]),
        Position::new(100.0, 0.0),
    );
    graph.connect(&root, 0, &event);

    let mut asset = Dialogue::new("event-test");
    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Compiled);

    graph.remove_node(&target);
    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Failed);
    assert!(graph.registry().lookup(&event).unwrap().error());
}

#[test]
fn jump_cycle_terminates_and_visits_each_node_once() {
    init_tracing();
    let mut graph = DialogueGraph::new("cycle-test");
    graph.add_speaker("npc");
    let root = graph.root().unwrap().clone();

    // Entry -> A -> Reroute -> Jump(A): a legal cycle back to an ancestor.
    let a = graph.add_node(NodeData::speech("npc", "A"), Position::new(100.0, 0.0));
    let reroute = graph.add_node(NodeData::Reroute, Position::new(200.0, 0.0));
    let jump = graph.add_node(NodeData::jump(Some(a.clone())), Position::new(300.0, 0.0));

    graph.connect(&root, 0, &a);
    graph.connect(&a, 0, &reroute);
    graph.connect(&reroute, 0, &jump);

    let mut asset = Dialogue::new("cycle-test");
    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Compiled);

    // Every node linked exactly once: no duplicated edges.
    assert_eq!(asset.node(&a).unwrap().children(), [reroute.clone()]);
    assert_eq!(asset.node(&a).unwrap().parents(), [root.clone()]);
    match asset.node(&jump).unwrap().payload() {
        NodePayload::Jump { target } => assert_eq!(target.as_ref(), Some(&a)),
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn jump_to_itself_fails_validation() {
    let mut graph = DialogueGraph::new("self-jump");
    let root = graph.root().unwrap().clone();
    let jump = graph.add_node(NodeData::jump(None), Position::new(100.0, 0.0));
    graph.connect(&root, 0, &jump);

    if let Some(node) = graph.registry_mut().lookup_mut(&jump) {
        if let NodeData::Jump(data) = node.data_mut() {
            data.target = Some(dtgc::NodeSocket::for_graph_node(jump.clone()));
        }
    }

    let mut asset = Dialogue::new("self-jump");
    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Failed);
    assert!(graph.registry().lookup(&jump).unwrap().error());
}

#[test]
fn unreachable_nodes_are_retained_but_unlinked() {
    let mut graph = DialogueGraph::new("island-test");
    graph.add_speaker("npc");
    let root = graph.root().unwrap().clone();
    let reachable = graph.add_node(NodeData::speech("npc", "hi"), Position::new(100.0, 0.0));
    let island = graph.add_node(NodeData::speech("npc", "lost"), Position::new(0.0, 300.0));
    graph.connect(&root, 0, &reachable);

    let mut asset = Dialogue::new("island-test");
    compile(&mut graph, &mut asset).unwrap();

    let island_node = asset.node(&island).expect("island still produced");
    assert!(island_node.parents().is_empty());
    assert!(island_node.children().is_empty());
    for node in asset.nodes() {
        assert!(!node.children().contains(&island));
    }
}

#[test]
fn speech_with_unknown_speaker_fails_validation() {
    let mut graph = DialogueGraph::new("speaker-test");
    let root = graph.root().unwrap().clone();
    let speech = graph.add_node(NodeData::speech("stranger", "hi"), Position::new(100.0, 0.0));
    graph.connect(&root, 0, &speech);

    let mut asset = Dialogue::new("speaker-test");
    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Failed);

    graph.add_speaker("stranger");
    assert_eq!(compile(&mut graph, &mut asset).unwrap(), CompileStatus::Compiled);
}

#[test]
fn recompile_replaces_the_previous_node_set() {
    let (mut graph, _, hello, _) = branch_fixture();
    let mut asset = Dialogue::new("branch-test");
    compile(&mut graph, &mut asset).unwrap();
    let first_count = asset.nodes().len();

    graph.remove_node(&hello);
    compile(&mut graph, &mut asset).unwrap();
    assert_eq!(asset.nodes().len(), first_count - 1);
    assert!(asset.node(&hello).is_none());
}

#[test]
fn entering_childless_reroute_ends_the_dialogue() {
    init_tracing();
    let mut graph = DialogueGraph::new("reroute-test");
    let root = graph.root().unwrap().clone();
    let reroute = graph.add_node(NodeData::Reroute, Position::new(100.0, 0.0));
    graph.connect(&root, 0, &reroute);

    let mut asset = Dialogue::new("reroute-test");
    compile(&mut graph, &mut asset).unwrap();

    assert_eq!(asset.enter(&reroute), EnterOutcome::Ended);
}

#[test]
fn speech_option_order_follows_horizontal_placement() {
    let mut graph = DialogueGraph::new("options-test");
    graph.add_speaker("npc");
    let root = graph.root().unwrap().clone();
    let prompt = graph.add_node(NodeData::speech("npc", "Pick one"), Position::new(100.0, 0.0));

    let far = graph.add_node(NodeData::speech("npc", "Option B"), Position::new(300.0, 100.0));
    let near = graph.add_node(NodeData::speech("npc", "Option A"), Position::new(150.0, 100.0));

    graph.connect(&root, 0, &prompt);
    // Connected right-to-left; placement, not connection order, wins.
    graph.connect(&prompt, 0, &far);
    graph.connect(&prompt, 0, &near);

    let mut asset = Dialogue::new("options-test");
    compile(&mut graph, &mut asset).unwrap();

    assert_eq!(asset.node(&prompt).unwrap().children(), [near, far]);
}
