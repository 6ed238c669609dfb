//! The project model: decoded objects plus resolved relationships.
//!
//! Construction is eager for the relationships every run needs (the target
//! list and product references); build phases, configuration lists and
//! group children are resolved on request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::ProjectError;
use super::object::{
    decode_objects, BuildConfiguration, DecodeOptions, ObjectKind, Objects, PbxProject,
    ProjectObject, Target, TargetKind,
};
use super::plist;

/// File name of the object table inside an `.xcodeproj` bundle.
pub const PBXPROJ_FILE: &str = "project.pbxproj";

/// A single decoded Xcode project.
#[derive(Debug, Clone)]
pub struct XcodeProject {
    path: PathBuf,
    objects: Objects,
    root: Option<String>,
    /// Target identifiers in project order.
    targets: Vec<String>,
    /// Target identifier -> product name.
    products: BTreeMap<String, String>,
}

impl XcodeProject {
    /// Load a project from an `.xcodeproj` bundle or a `project.pbxproj` file.
    pub fn load(path: &Path, opts: DecodeOptions) -> Result<Self, ProjectError> {
        let file = if path.is_dir() {
            path.join(PBXPROJ_FILE)
        } else {
            path.to_path_buf()
        };

        let text = std::fs::read_to_string(&file).map_err(|source| ProjectError::Io {
            path: file.clone(),
            source,
        })?;

        let bundle = if path.is_dir() { path } else { path.parent().unwrap_or(path) };
        Self::parse(&text, bundle, opts)
    }

    /// Parse project file text. `path` is recorded for naming and messages.
    pub fn parse(text: &str, path: &Path, opts: DecodeOptions) -> Result<Self, ProjectError> {
        let value = plist::parse(text).map_err(|source| ProjectError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let table = value
            .get("objects")
            .and_then(Value::as_object)
            .ok_or_else(|| ProjectError::MissingTable {
                path: path.to_path_buf(),
                key: "objects",
            })?;
        let root = value.get("rootObject").and_then(Value::as_str).map(str::to_string);

        let objects = decode_objects(table, opts)?;
        let mut project = Self::from_objects(objects, root)?;
        project.path = path.to_path_buf();
        Ok(project)
    }

    /// Build a model over already decoded objects.
    pub fn from_objects(objects: Objects, root: Option<String>) -> Result<Self, ProjectError> {
        let targets = match root.as_deref() {
            Some(root_id) => {
                let project = lookup(&objects, "rootObject", "rootObject", root_id)?
                    .as_project()
                    .ok_or_else(|| ProjectError::UnresolvedReference {
                        owner: "rootObject".to_string(),
                        field: "rootObject",
                        identifier: root_id.to_string(),
                    })?;

                let mut targets = Vec::with_capacity(project.targets.len());
                for id in &project.targets {
                    let object = lookup(&objects, root_id, "targets", id)?;
                    if object.as_target().is_none() {
                        return Err(ProjectError::UnresolvedReference {
                            owner: root_id.to_string(),
                            field: "targets",
                            identifier: id.clone(),
                        });
                    }
                    targets.push(id.clone());
                }
                targets
            }
            None => objects
                .values()
                .filter(|o| o.as_target().is_some())
                .map(|o| o.identifier().to_string())
                .collect(),
        };

        let mut products = BTreeMap::new();
        for id in &targets {
            let Some(target) = objects.get(id).and_then(ProjectObject::as_target) else {
                continue;
            };
            let Some(product_ref) = &target.product_reference else {
                continue;
            };

            let product = lookup(&objects, &target.identifier, "productReference", product_ref)?;
            match product.kind() {
                ObjectKind::FileReference(file) => match file.display_name() {
                    Some(name) => {
                        products.insert(id.clone(), name.to_string());
                    }
                    None => tracing::warn!(
                        "product reference `{}` of `{}` has no path or name",
                        product_ref,
                        target.name
                    ),
                },
                _ => tracing::warn!(
                    "product reference `{}` of `{}` is a {}, not a file reference",
                    product_ref,
                    target.name,
                    product.isa()
                ),
            }
        }

        Ok(XcodeProject {
            path: PathBuf::new(),
            objects,
            root,
            targets,
            products,
        })
    }

    /// Path of the project bundle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Project name, from the bundle's file stem.
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("project")
    }

    /// Look up an object by identifier.
    pub fn object(&self, identifier: &str) -> Option<&ProjectObject> {
        self.objects.get(identifier)
    }

    /// Identifier of the project root object, when the file names one.
    pub fn root_identifier(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// The project root object.
    pub fn root(&self) -> Option<&PbxProject> {
        self.root
            .as_deref()
            .and_then(|id| self.objects.get(id))
            .and_then(ProjectObject::as_project)
    }

    /// Targets in project order.
    pub fn targets(&self) -> Vec<&Target> {
        self.targets
            .iter()
            .filter_map(|id| self.objects.get(id).and_then(ProjectObject::as_target))
            .collect()
    }

    /// Find a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets().into_iter().find(|t| t.name == name)
    }

    /// Product name of a target. `None` means no artifact is expected.
    pub fn product_name(&self, target: &Target) -> Option<&str> {
        self.products.get(&target.identifier).map(String::as_str)
    }

    /// Target name -> product name, for every target with a product.
    pub fn targets_to_products(&self) -> BTreeMap<String, String> {
        self.targets()
            .into_iter()
            .filter_map(|t| {
                self.product_name(t)
                    .map(|product| (t.name.clone(), product.to_string()))
            })
            .collect()
    }

    /// Resolve an identifier-valued field of `owner`.
    pub fn resolve(
        &self,
        owner: &str,
        field: &'static str,
        identifier: &str,
    ) -> Result<&ProjectObject, ProjectError> {
        lookup(&self.objects, owner, field, identifier)
    }

    /// The build phases of a target, in order.
    pub fn build_phases(&self, target: &Target) -> Result<Vec<&ProjectObject>, ProjectError> {
        target
            .build_phases
            .iter()
            .map(|id| {
                let object = self.resolve(&target.identifier, "buildPhases", id)?;
                match object.kind() {
                    ObjectKind::BuildPhase(_) => Ok(object),
                    _ => Err(ProjectError::UnresolvedReference {
                        owner: target.identifier.clone(),
                        field: "buildPhases",
                        identifier: id.clone(),
                    }),
                }
            })
            .collect()
    }

    /// The build configurations of a target, via its configuration list.
    pub fn build_configurations(
        &self,
        target: &Target,
    ) -> Result<Vec<&BuildConfiguration>, ProjectError> {
        let Some(list_id) = &target.build_configuration_list else {
            return Ok(Vec::new());
        };

        let list = match self
            .resolve(&target.identifier, "buildConfigurationList", list_id)?
            .kind()
        {
            ObjectKind::ConfigurationList(list) => list,
            _ => {
                return Err(ProjectError::UnresolvedReference {
                    owner: target.identifier.clone(),
                    field: "buildConfigurationList",
                    identifier: list_id.clone(),
                })
            }
        };

        list.build_configurations
            .iter()
            .map(|id| match self.resolve(list_id, "buildConfigurations", id)?.kind() {
                ObjectKind::BuildConfiguration(config) => Ok(config),
                _ => Err(ProjectError::UnresolvedReference {
                    owner: list_id.clone(),
                    field: "buildConfigurations",
                    identifier: id.clone(),
                }),
            })
            .collect()
    }

    /// The children of a group or variant group.
    pub fn group_children(&self, group_id: &str) -> Result<Vec<&ProjectObject>, ProjectError> {
        let group = match self.resolve(group_id, "group", group_id)?.kind() {
            ObjectKind::Group(group) => group,
            _ => return Ok(Vec::new()),
        };

        group
            .children
            .iter()
            .map(|id| self.resolve(group_id, "children", id))
            .collect()
    }

    /// Whether `target` produces no artifact by construction.
    pub fn is_productless(&self, target: &Target) -> bool {
        target.kind != TargetKind::Native || self.product_name(target).is_none()
    }
}

fn lookup<'a>(
    objects: &'a Objects,
    owner: &str,
    field: &'static str,
    identifier: &str,
) -> Result<&'a ProjectObject, ProjectError> {
    objects
        .get(identifier)
        .ok_or_else(|| ProjectError::UnresolvedReference {
            owner: owner.to_string(),
            field,
            identifier: identifier.to_string(),
        })
}
