//! Target dependency resolution and the target dependency graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::errors::{CycleError, ProjectError};
use super::model::XcodeProject;
use super::object::{ContainerItemProxy, ObjectKind, ProjectObject, Target};

/// A resolved dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetDependency {
    /// Another target, in this project or a sibling project of the workspace.
    Native { identifier: String, name: String },
    /// A product of an external package, known only by name.
    Package { identifier: String, product_name: String },
}

impl TargetDependency {
    /// The name the dependency is known by in the graph.
    pub fn name(&self) -> &str {
        match self {
            TargetDependency::Native { name, .. } => name,
            TargetDependency::Package { product_name, .. } => product_name,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, TargetDependency::Native { .. })
    }
}

/// Resolves the dependency lists of a project's targets.
pub struct DependencyResolver<'a> {
    project: &'a XcodeProject,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(project: &'a XcodeProject) -> Self {
        DependencyResolver { project }
    }

    /// Resolve one target's direct dependencies.
    ///
    /// This is a single pass over the target's own lists; nothing is expanded
    /// recursively, so a cyclic project can't make it loop.
    pub fn resolve(&self, target: &Target) -> Result<BTreeSet<TargetDependency>, ProjectError> {
        let mut resolved = BTreeSet::new();

        for id in &target.dependencies {
            resolved.insert(self.resolve_identifier(target, id)?);
        }

        for id in &target.package_product_dependencies {
            let object = self.lookup(target, "packageProductDependencies", id)?;
            match object.kind() {
                ObjectKind::PackageProduct(product) => {
                    resolved.insert(TargetDependency::Package {
                        identifier: id.clone(),
                        product_name: product.product_name.clone(),
                    });
                }
                _ => return Err(unresolved(target, id)),
            }
        }

        Ok(resolved)
    }

    /// Resolve every target of the project into a graph.
    pub fn resolve_all(&self) -> Result<DependencyGraph, ProjectError> {
        let mut graph = DependencyGraph::new();
        for target in self.project.targets() {
            let deps = self.resolve(target)?;
            tracing::debug!(
                "`{}` depends on [{}]",
                target.name,
                deps.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
            );
            graph.add_target(&target.name, deps);
        }
        Ok(graph)
    }

    fn lookup(
        &self,
        target: &Target,
        field: &'static str,
        id: &str,
    ) -> Result<&'a ProjectObject, ProjectError> {
        self.project
            .object(id)
            .ok_or_else(|| ProjectError::UnresolvedReference {
                owner: target.name.clone(),
                field,
                identifier: id.to_string(),
            })
    }

    fn resolve_identifier(
        &self,
        target: &Target,
        id: &str,
    ) -> Result<TargetDependency, ProjectError> {
        let object = self.lookup(target, "dependencies", id)?;

        match object.kind() {
            ObjectKind::Target(dep) => Ok(native(dep)),
            ObjectKind::PackageProduct(product) => Ok(TargetDependency::Package {
                identifier: id.to_string(),
                product_name: product.product_name.clone(),
            }),
            ObjectKind::ContainerItemProxy(proxy) => self.through_proxy(target, id, proxy),
            ObjectKind::TargetDependency(record) => {
                if let Some(target_id) = &record.target {
                    let object = self.lookup(target, "target", target_id)?;
                    return object
                        .as_target()
                        .map(native)
                        .ok_or_else(|| unresolved(target, id));
                }
                if let Some(proxy_id) = &record.target_proxy {
                    return match self.lookup(target, "targetProxy", proxy_id)?.kind() {
                        ObjectKind::ContainerItemProxy(proxy) => {
                            self.through_proxy(target, proxy_id, proxy)
                        }
                        _ => Err(unresolved(target, id)),
                    };
                }
                if let Some(product_id) = &record.product_ref {
                    return match self.lookup(target, "productRef", product_id)?.kind() {
                        ObjectKind::PackageProduct(product) => Ok(TargetDependency::Package {
                            identifier: product_id.clone(),
                            product_name: product.product_name.clone(),
                        }),
                        _ => Err(unresolved(target, id)),
                    };
                }
                Err(unresolved(target, id))
            }
            _ => Err(unresolved(target, id)),
        }
    }

    /// Follow exactly one level of proxy indirection.
    fn through_proxy(
        &self,
        target: &Target,
        proxy_id: &str,
        proxy: &ContainerItemProxy,
    ) -> Result<TargetDependency, ProjectError> {
        match self.project.object(&proxy.remote_global_id) {
            Some(remote) => match remote.kind() {
                ObjectKind::Target(dep) => Ok(native(dep)),
                ObjectKind::PackageProduct(product) => Ok(TargetDependency::Package {
                    identifier: proxy.remote_global_id.clone(),
                    product_name: product.product_name.clone(),
                }),
                _ => Err(unresolved(target, proxy_id)),
            },
            // Points into another project of the workspace; only its name is known here.
            None if self.is_cross_project(proxy) => match &proxy.remote_info {
                Some(name) => Ok(TargetDependency::Native {
                    identifier: proxy.remote_global_id.clone(),
                    name: name.clone(),
                }),
                None => Err(unresolved(target, proxy_id)),
            },
            None => Err(ProjectError::UnresolvedReference {
                owner: proxy_id.to_string(),
                field: "remoteGlobalIDString",
                identifier: proxy.remote_global_id.clone(),
            }),
        }
    }

    fn is_cross_project(&self, proxy: &ContainerItemProxy) -> bool {
        self.project
            .root_identifier()
            .is_some_and(|root| root != proxy.container_portal)
    }
}

fn native(target: &Target) -> TargetDependency {
    TargetDependency::Native {
        identifier: target.identifier.clone(),
        name: target.name.clone(),
    }
}

fn unresolved(target: &Target, id: &str) -> ProjectError {
    ProjectError::UnresolvedDependency {
        target: target.name.clone(),
        identifier: id.to_string(),
    }
}

/// Directed graph of target names; an edge `a -> b` means `a` depends on `b`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    dependencies: BTreeMap<String, BTreeSet<TargetDependency>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&node) = self.nodes.get(name) {
            return node;
        }
        let node = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), node);
        node
    }

    /// Record a target and its resolved direct dependencies.
    pub fn add_target(&mut self, name: &str, deps: BTreeSet<TargetDependency>) {
        let from = self.node(name);
        for dep in &deps {
            let to = self.node(dep.name());
            if !self.graph.contains_edge(from, to) {
                self.graph.add_edge(from, to, ());
            }
        }
        self.dependencies.entry(name.to_string()).or_default().extend(deps);
    }

    /// Fold another project's graph into this one.
    pub fn merge(&mut self, other: DependencyGraph) {
        for (name, deps) in other.dependencies {
            self.add_target(&name, deps);
        }
    }

    /// Target name -> names it directly depends on.
    pub fn dependency_graph(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.nodes
            .keys()
            .map(|name| (name.clone(), self.direct(name).into_iter().collect()))
            .collect()
    }

    /// Names `name` directly depends on, sorted.
    pub fn direct(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Names that directly depend on `name`, sorted.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(&node) = self.nodes.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort();
        names
    }

    /// Whether the graph contains any cycle.
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Every name reachable from `name`, dependencies before dependents.
    ///
    /// Each node is expanded at most once; coming back to a node on the
    /// current path reports the cycle instead of looping.
    pub fn transitive_dependencies(&self, name: &str) -> Result<Vec<String>, CycleError> {
        let mut visited = BTreeSet::new();
        let mut path = Vec::new();
        let mut order = Vec::new();
        self.visit(name, &mut path, &mut visited, &mut order)?;
        order.retain(|n| n != name);
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        path: &mut Vec<String>,
        visited: &mut BTreeSet<String>,
        order: &mut Vec<String>,
    ) -> Result<(), CycleError> {
        if let Some(start) = path.iter().position(|n| n == name) {
            let mut cycle = path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(CycleError { cycle });
        }
        if !visited.insert(name.to_string()) {
            return Ok(());
        }

        path.push(name.to_string());
        for dep in self.direct(name) {
            self.visit(&dep, path, visited, order)?;
        }
        path.pop();
        order.push(name.to_string());
        Ok(())
    }
}
