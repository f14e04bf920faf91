//! Reverse index over the composition graph.
//!
//! Answers two questions the rewrite rules need: who owns a node, and who
//! refers to it through a non-owning edge (expression-animation parameters,
//! `VisualSurface` sources). Owning parents are intrinsic to the arena's
//! edges and stay correct as the elision helpers rewrite them; the
//! in-reference table is a snapshot, rebuilt once per optimizer iteration.

use crate::model::{CompGraph, NodeIndex, NodeKind};
use crate::name::PropName;
use std::collections::HashMap;

// ─── In-references ───────────────────────────────────────────────────────

/// Why a node is referenced from outside its owning chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InRefKind {
    /// Named parameter of an `ExpressionAnimation`.
    ExpressionParameter(PropName),
    /// `VisualSurface.Source`.
    SurfaceSource,
}

/// One non-owning reference to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InRef {
    /// The referring node (the expression animation or visual surface).
    pub referer: NodeIndex,
    pub kind: InRefKind,
}

// ─── Index ───────────────────────────────────────────────────────────────

/// Snapshot of non-owning reference edges, keyed by target.
#[derive(Debug, Default)]
pub struct GraphIndex {
    in_refs: HashMap<NodeIndex, Vec<InRef>>,
}

impl GraphIndex {
    /// Walk the arena once and record every non-owning reference.
    #[must_use]
    pub fn build(graph: &CompGraph) -> Self {
        let mut in_refs: HashMap<NodeIndex, Vec<InRef>> = HashMap::new();
        for idx in graph.graph.node_indices() {
            match &graph.node(idx).kind {
                NodeKind::ExpressionAnimation { references, .. } => {
                    for &(name, target) in references {
                        in_refs.entry(target).or_default().push(InRef {
                            referer: idx,
                            kind: InRefKind::ExpressionParameter(name),
                        });
                    }
                }
                NodeKind::VisualSurface {
                    source: Some(source),
                    ..
                } => {
                    in_refs.entry(*source).or_default().push(InRef {
                        referer: idx,
                        kind: InRefKind::SurfaceSource,
                    });
                }
                _ => {}
            }
        }
        Self { in_refs }
    }

    /// The owning parent. Delegates to the arena, which is always current.
    pub fn parent(&self, graph: &CompGraph, idx: NodeIndex) -> Option<NodeIndex> {
        graph.parent(idx)
    }

    /// Non-owning references to `idx`, in discovery order.
    pub fn in_references(&self, idx: NodeIndex) -> &[InRef] {
        self.in_refs.get(&idx).map_or(&[], Vec::as_slice)
    }

    /// True if `idx` is the source of some `VisualSurface`.
    pub fn is_surface_source(&self, idx: NodeIndex) -> bool {
        self.in_references(idx)
            .iter()
            .any(|r| r.kind == InRefKind::SurfaceSource)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind, VisualProps};

    #[test]
    fn expression_references_are_indexed() {
        let mut g = CompGraph::new();
        let expr = g.add_node(Node::new(NodeKind::ExpressionAnimation {
            expression: "root.Progress".into(),
            references: vec![(PropName::intern("root"), g.root)],
        }));

        let index = GraphIndex::build(&g);
        let refs = index.in_references(g.root);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].referer, expr);
        assert!(matches!(refs[0].kind, InRefKind::ExpressionParameter(_)));
    }

    #[test]
    fn surface_sources_are_indexed() {
        let mut g = CompGraph::new();
        let target = g.add_child(
            g.root,
            Node::new(NodeKind::ContainerVisual(VisualProps::default())),
        );
        g.add_node(Node::new(NodeKind::VisualSurface {
            source: Some(target),
            source_size: None,
            source_offset: None,
        }));

        let index = GraphIndex::build(&g);
        assert!(index.is_surface_source(target));
        assert!(!index.is_surface_source(g.root));
    }
}
