use std::collections::HashMap;

use super::ComponentId;
use super::Outlet;
use super::SharedComponent;
use crate::EtlError;
use crate::Result;

/// Components of one path and the routes between them
///
/// Insertion order is kept; paths insert upstream first, so
/// [`ComponentGraph::components`] is a topological order.
#[derive(Default)]
pub struct ComponentGraph {
    order: Vec<ComponentId>,
    nodes: HashMap<ComponentId, SharedComponent>,
    edges: HashMap<ComponentId, Vec<ComponentId>>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(
        &mut self,
        component: SharedComponent,
    ) -> Result<()> {
        let id = component.id().clone();
        if self.nodes.contains_key(&id) {
            return Err(EtlError::ComponentExists(id.to_string()).into());
        }
        self.order.push(id.clone());
        self.nodes.insert(id, component);
        Ok(())
    }

    pub fn get(
        &self,
        id: &ComponentId,
    ) -> Result<&SharedComponent> {
        self.nodes
            .get(id)
            .ok_or_else(|| EtlError::ComponentNotFound(id.to_string()).into())
    }

    /// Routes `from`'s output into `to`'s input channel.
    pub fn add_edge(
        &mut self,
        from: &ComponentId,
        to: &ComponentId,
    ) -> Result<()> {
        let source = self.get(from)?.clone();
        let target = self.get(to)?.clone();

        if self.edges.get(from).is_some_and(|outs| outs.contains(to)) {
            return Err(EtlError::EdgeExists(from.to_string(), to.to_string()).into());
        }

        let input = target
            .input()
            .ok_or_else(|| EtlError::NoInput(to.to_string()))?;
        source.router().add_route(to.as_str(), Outlet::Component(input))?;

        self.edges.entry(from.clone()).or_default().push(to.clone());
        Ok(())
    }

    pub fn downstream(
        &self,
        id: &ComponentId,
    ) -> &[ComponentId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Components upstream first
    pub fn components(&self) -> Vec<SharedComponent> {
        self.order.iter().filter_map(|id| self.nodes.get(id).cloned()).collect()
    }

    /// Last inserted component; the path's output
    pub fn terminal(&self) -> Option<&SharedComponent> {
        self.order.last().and_then(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
