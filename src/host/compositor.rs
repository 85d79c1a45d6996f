//! Minimal compositor node graph and the capture wiring step.
//!
//! Hosts often expose the final composite only through a side channel. The capture node (a
//! viewer) is attached in parallel with the final output: whatever feeds `Composite.Image`
//! (and `Composite.Alpha`, when linked) is routed through a reroute into both the composite
//! and the viewer, so the composite keeps its value while the viewer's buffer becomes
//! readable.

use crate::foundation::error::{BlurError, BlurResult};

pub const IMAGE: &str = "Image";
pub const ALPHA: &str = "Alpha";
const REROUTE_IN: &str = "Input";
const REROUTE_OUT: &str = "Output";

const NO_SOCKETS: &[&str] = &[];
const IMAGE_ALPHA: &[&str] = &[IMAGE, ALPHA];
const IMAGE_ONLY: &[&str] = &[IMAGE];
const REROUTE_INPUTS: &[&str] = &[REROUTE_IN];
const REROUTE_OUTPUTS: &[&str] = &[REROUTE_OUT];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    RenderLayers,
    Composite,
    Viewer,
    Reroute,
    /// Any filter node with one image in and one image out.
    Filter(String),
}

impl NodeKind {
    /// `(inputs, outputs)`.
    fn sockets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        match self {
            Self::RenderLayers => (NO_SOCKETS, IMAGE_ALPHA),
            Self::Composite | Self::Viewer => (IMAGE_ALPHA, NO_SOCKETS),
            Self::Reroute => (REROUTE_INPUTS, REROUTE_OUTPUTS),
            Self::Filter(_) => (IMAGE_ONLY, IMAGE_ONLY),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SocketRef {
    pub node: NodeId,
    pub socket: String,
}

impl SocketRef {
    pub fn new(node: NodeId, socket: &str) -> Self {
        Self {
            node,
            socket: socket.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Link {
    pub from: SocketRef,
    pub to: SocketRef,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render layers feeding the composite's image and alpha directly.
    pub fn default_render_graph() -> Self {
        let mut g = Self::new();
        let layers = g.add_node(NodeKind::RenderLayers);
        let comp = g.add_node(NodeKind::Composite);
        // Both links are between sockets that exist by construction.
        let _ = g.link(SocketRef::new(layers, IMAGE), SocketRef::new(comp, IMAGE));
        let _ = g.link(SocketRef::new(layers, ALPHA), SocketRef::new(comp, ALPHA));
        g
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { id, kind });
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn find_kind(&self, kind: &NodeKind) -> Option<NodeId> {
        self.nodes.iter().find(|n| &n.kind == kind).map(|n| n.id)
    }

    /// Connect an output socket to an input socket. An input holds at most one link; an
    /// existing link into `to` is replaced.
    pub fn link(&mut self, from: SocketRef, to: SocketRef) -> BlurResult<()> {
        let from_node = self
            .node(from.node)
            .ok_or_else(|| BlurError::compositor(format!("unknown node {:?}", from.node)))?;
        if !from_node.kind.sockets().1.contains(&from.socket.as_str()) {
            return Err(BlurError::compositor(format!(
                "{:?} has no output '{}'",
                from_node.kind, from.socket
            )));
        }
        let to_node = self
            .node(to.node)
            .ok_or_else(|| BlurError::compositor(format!("unknown node {:?}", to.node)))?;
        if !to_node.kind.sockets().0.contains(&to.socket.as_str()) {
            return Err(BlurError::compositor(format!(
                "{:?} has no input '{}'",
                to_node.kind, to.socket
            )));
        }
        self.links.retain(|l| l.to != to);
        self.links.push(Link { from, to });
        Ok(())
    }

    /// Output socket linked into `input`, if any.
    pub fn source_of(&self, input: &SocketRef) -> Option<&SocketRef> {
        self.links.iter().find(|l| &l.to == input).map(|l| &l.from)
    }

    /// The non-reroute output that ultimately feeds `input`.
    pub fn upstream_value(&self, input: &SocketRef) -> Option<SocketRef> {
        let mut current = self.source_of(input)?.clone();
        // A well-formed graph is acyclic; the bound guards malformed input.
        for _ in 0..=self.nodes.len() {
            let node = self.node(current.node)?;
            if node.kind != NodeKind::Reroute {
                return Some(current);
            }
            current = self
                .source_of(&SocketRef::new(current.node, REROUTE_IN))?
                .clone();
        }
        None
    }

    /// True when a viewer receives an image.
    pub fn has_linked_viewer(&self) -> bool {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Viewer)
            .any(|n| self.source_of(&SocketRef::new(n.id, IMAGE)).is_some())
    }
}

/// Result of [`ensure_capture_wired`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WiringOutcome {
    /// A viewer was already present; nothing changed.
    AlreadyWired,
    /// A viewer was added behind `reroutes` reroute nodes.
    Wired { reroutes: usize },
}

fn route_through_reroute(
    graph: &mut NodeGraph,
    source: SocketRef,
    composite: NodeId,
    viewer: NodeId,
    socket: &str,
) -> BlurResult<()> {
    let reroute = graph.add_node(NodeKind::Reroute);
    graph.link(source, SocketRef::new(reroute, REROUTE_IN))?;
    graph.link(
        SocketRef::new(reroute, REROUTE_OUT),
        SocketRef::new(viewer, socket),
    )?;
    graph.link(
        SocketRef::new(reroute, REROUTE_OUT),
        SocketRef::new(composite, socket),
    )
}

/// Attach a viewer in parallel with the composite output. Idempotent: a graph that already
/// has a viewer is left untouched.
pub fn ensure_capture_wired(graph: &mut NodeGraph) -> BlurResult<WiringOutcome> {
    if graph.find_kind(&NodeKind::Viewer).is_some() {
        return Ok(WiringOutcome::AlreadyWired);
    }
    let composite = graph
        .find_kind(&NodeKind::Composite)
        .ok_or_else(|| BlurError::compositor("no composite output node"))?;
    let image_src = graph
        .source_of(&SocketRef::new(composite, IMAGE))
        .cloned()
        .ok_or_else(|| BlurError::compositor("composite image input is not linked"))?;
    let alpha_src = graph
        .source_of(&SocketRef::new(composite, ALPHA))
        .cloned();

    let viewer = graph.add_node(NodeKind::Viewer);
    route_through_reroute(graph, image_src, composite, viewer, IMAGE)?;
    let mut reroutes = 1;
    if let Some(alpha_src) = alpha_src {
        route_through_reroute(graph, alpha_src, composite, viewer, ALPHA)?;
        reroutes += 1;
    }
    tracing::debug!(reroutes, "capture viewer wired into compositor");
    Ok(WiringOutcome::Wired { reroutes })
}

#[cfg(test)]
#[path = "../../tests/unit/host/compositor.rs"]
mod tests;
