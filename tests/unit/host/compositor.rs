use super::*;

fn composite_of(g: &NodeGraph) -> NodeId {
    g.find_kind(&NodeKind::Composite).unwrap()
}

#[test]
fn wires_image_and_alpha_without_changing_composite_value() {
    let mut g = NodeGraph::default_render_graph();
    let comp = composite_of(&g);
    let before_img = g.upstream_value(&SocketRef::new(comp, IMAGE));
    let before_alpha = g.upstream_value(&SocketRef::new(comp, ALPHA));

    let outcome = ensure_capture_wired(&mut g).unwrap();
    assert_eq!(outcome, WiringOutcome::Wired { reroutes: 2 });

    assert_eq!(g.upstream_value(&SocketRef::new(comp, IMAGE)), before_img);
    assert_eq!(g.upstream_value(&SocketRef::new(comp, ALPHA)), before_alpha);

    let viewer = g.find_kind(&NodeKind::Viewer).unwrap();
    assert_eq!(g.upstream_value(&SocketRef::new(viewer, IMAGE)), before_img);
    assert_eq!(g.upstream_value(&SocketRef::new(viewer, ALPHA)), before_alpha);
    assert!(g.has_linked_viewer());
}

#[test]
fn second_call_is_a_no_op() {
    let mut g = NodeGraph::default_render_graph();
    ensure_capture_wired(&mut g).unwrap();
    let snapshot = g.clone();
    assert_eq!(ensure_capture_wired(&mut g).unwrap(), WiringOutcome::AlreadyWired);
    assert_eq!(g, snapshot);
}

#[test]
fn image_only_graph_gets_one_reroute() {
    let mut g = NodeGraph::new();
    let layers = g.add_node(NodeKind::RenderLayers);
    let blur = g.add_node(NodeKind::Filter("glare".to_string()));
    let comp = g.add_node(NodeKind::Composite);
    g.link(SocketRef::new(layers, IMAGE), SocketRef::new(blur, IMAGE))
        .unwrap();
    g.link(SocketRef::new(blur, IMAGE), SocketRef::new(comp, IMAGE))
        .unwrap();

    assert_eq!(
        ensure_capture_wired(&mut g).unwrap(),
        WiringOutcome::Wired { reroutes: 1 }
    );
    let viewer = g.find_kind(&NodeKind::Viewer).unwrap();
    assert_eq!(
        g.upstream_value(&SocketRef::new(viewer, IMAGE)),
        Some(SocketRef::new(blur, IMAGE))
    );
    assert_eq!(g.source_of(&SocketRef::new(viewer, ALPHA)), None);
}

#[test]
fn unlinked_composite_is_an_error() {
    let mut g = NodeGraph::new();
    g.add_node(NodeKind::Composite);
    assert!(matches!(
        ensure_capture_wired(&mut g),
        Err(BlurError::Compositor(_))
    ));

    let mut empty = NodeGraph::new();
    assert!(ensure_capture_wired(&mut empty).is_err());
}

#[test]
fn link_validates_sockets_and_replaces_input() {
    let mut g = NodeGraph::new();
    let a = g.add_node(NodeKind::RenderLayers);
    let b = g.add_node(NodeKind::RenderLayers);
    let comp = g.add_node(NodeKind::Composite);
    assert!(g.link(SocketRef::new(comp, IMAGE), SocketRef::new(a, IMAGE)).is_err());
    assert!(g.link(SocketRef::new(a, "Depth"), SocketRef::new(comp, IMAGE)).is_err());

    g.link(SocketRef::new(a, IMAGE), SocketRef::new(comp, IMAGE)).unwrap();
    g.link(SocketRef::new(b, IMAGE), SocketRef::new(comp, IMAGE)).unwrap();
    assert_eq!(g.links().len(), 1);
    assert_eq!(
        g.source_of(&SocketRef::new(comp, IMAGE)),
        Some(&SocketRef::new(b, IMAGE))
    );
}

#[test]
fn existing_viewer_counts_as_wired() {
    let mut g = NodeGraph::default_render_graph();
    g.add_node(NodeKind::Viewer);
    assert_eq!(ensure_capture_wired(&mut g).unwrap(), WiringOutcome::AlreadyWired);
    assert!(!g.has_linked_viewer());
}
