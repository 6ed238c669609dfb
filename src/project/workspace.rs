//! Workspace - the set of projects a run extracts from.
//!
//! A workspace is either a single `.xcodeproj` or an `.xcworkspace` whose
//! `contents.xcworkspacedata` lists member projects. Target, product and
//! dependency information is merged across members.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::dependency::{DependencyGraph, DependencyResolver};
use super::errors::ProjectError;
use super::model::XcodeProject;
use super::object::{DecodeOptions, Target};

/// Workspace manifest inside an `.xcworkspace` bundle.
pub const WORKSPACE_DATA_FILE: &str = "contents.xcworkspacedata";

static FILE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<FileRef\s+location\s*=\s*"([A-Za-z]+):([^"]*)""#).expect("valid FileRef pattern")
});

/// All projects taking part in a run.
#[derive(Debug, Clone)]
pub struct Workspace {
    path: PathBuf,
    projects: Vec<XcodeProject>,
}

impl Workspace {
    /// Load an `.xcworkspace`, `.xcodeproj` or `project.pbxproj`.
    pub fn load(path: &Path, opts: DecodeOptions) -> Result<Self, ProjectError> {
        let projects = if path.extension().is_some_and(|ext| ext == "xcworkspace") {
            let data_path = path.join(WORKSPACE_DATA_FILE);
            let data = std::fs::read_to_string(&data_path).map_err(|source| ProjectError::Io {
                path: data_path,
                source,
            })?;

            let mut projects = Vec::new();
            for project_path in project_paths(path, &data) {
                tracing::debug!("loading workspace member {}", project_path.display());
                projects.push(XcodeProject::load(&project_path, opts)?);
            }
            projects
        } else {
            vec![XcodeProject::load(path, opts)?]
        };

        tracing::info!(
            "loaded {} project(s) with {} target(s)",
            projects.len(),
            projects.iter().map(|p| p.targets().len()).sum::<usize>()
        );

        Ok(Workspace {
            path: path.to_path_buf(),
            projects,
        })
    }

    /// Wrap already loaded projects.
    pub fn from_projects(path: impl Into<PathBuf>, projects: Vec<XcodeProject>) -> Self {
        Workspace {
            path: path.into(),
            projects,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn projects(&self) -> &[XcodeProject] {
        &self.projects
    }

    /// Every target of every member, paired with its project.
    pub fn targets(&self) -> Vec<(&XcodeProject, &Target)> {
        self.projects
            .iter()
            .flat_map(|project| project.targets().into_iter().map(move |t| (project, t)))
            .collect()
    }

    /// Target name -> product name across all members.
    pub fn targets_to_products(&self) -> BTreeMap<String, String> {
        let mut products = BTreeMap::new();
        for project in &self.projects {
            for (target, product) in project.targets_to_products() {
                if let Some(previous) = products.insert(target.clone(), product) {
                    tracing::warn!(
                        "target `{}` appears in more than one project; keeping the product from {}",
                        target,
                        project.name()
                    );
                    tracing::debug!("discarded product `{}`", previous);
                }
            }
        }
        products
    }

    /// Resolve dependencies of every member and merge the graphs.
    pub fn dependency_graph(&self) -> Result<DependencyGraph, ProjectError> {
        let mut graph = DependencyGraph::new();
        for project in &self.projects {
            graph.merge(DependencyResolver::new(project).resolve_all()?);
        }
        Ok(graph)
    }
}

/// Project bundles listed by a workspace manifest, in listed order.
///
/// `group:` and `container:` locations are relative to the directory holding
/// the workspace; `absolute:` locations are used as-is; `self:` names the
/// project the workspace is embedded in.
pub fn project_paths(workspace: &Path, data: &str) -> Vec<PathBuf> {
    let base = workspace.parent().unwrap_or(Path::new("."));

    FILE_REF
        .captures_iter(data)
        .filter_map(|cap| {
            let scheme = cap.get(1)?.as_str();
            let location = cap.get(2)?.as_str();
            let path = match scheme {
                "absolute" => PathBuf::from(location),
                "self" => base.to_path_buf(),
                _ => base.join(location),
            };
            path.extension()
                .is_some_and(|ext| ext == "xcodeproj")
                .then_some(path)
        })
        .collect()
}
