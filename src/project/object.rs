//! Typed project objects and the decoder for the flat object table.
//!
//! A project file is a table of `identifier -> record`, where every record
//! names its kind in an `isa` field. Decoding dispatches on that field and
//! leaves every identifier-valued field as a raw string; references are
//! resolved afterwards by [`XcodeProject`](super::model::XcodeProject), once
//! the whole table is available.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::DecodeError;

/// Decoded objects, keyed by identifier.
pub type Objects = BTreeMap<String, ProjectObject>;

/// Options controlling which fields the decoder populates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Keep diagnostic-only fields. When off, they are dropped before decoding.
    pub verbose: bool,
}

/// Any record from the project file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectObject {
    identifier: String,
    isa: String,
    kind: ObjectKind,
}

/// Kind-specific payload of a [`ProjectObject`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Project(PbxProject),
    Target(Target),
    TargetDependency(TargetDependencyRecord),
    ContainerItemProxy(ContainerItemProxy),
    PackageProduct(PackageProductDependency),
    FileReference(FileReference),
    Group(Group),
    BuildPhase(BuildPhase),
    BuildConfiguration(BuildConfiguration),
    ConfigurationList(ConfigurationList),
    /// A kind this crate doesn't model; only identifier and `isa` are kept.
    Other,
}

impl ProjectObject {
    /// The object's identifier within the project file.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The object's discriminant (`isa`).
    pub fn isa(&self) -> &str {
        &self.isa
    }

    /// The kind-specific payload.
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn as_target(&self) -> Option<&Target> {
        match &self.kind {
            ObjectKind::Target(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_project(&self) -> Option<&PbxProject> {
        match &self.kind {
            ObjectKind::Project(project) => Some(project),
            _ => None,
        }
    }

    /// Whether this object is one of the modelled kinds.
    pub fn is_recognized(&self) -> bool {
        !matches!(self.kind, ObjectKind::Other)
    }
}

/// The project root (`PBXProject`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbxProject {
    pub targets: Vec<String>,
    pub build_configuration_list: Option<String>,
    pub main_group: Option<String>,
    pub product_ref_group: Option<String>,
    pub project_dir_path: Option<String>,
    pub project_root: Option<String>,
    pub compatibility_version: Option<String>,
    pub development_region: Option<String>,
    #[serde(default)]
    pub known_regions: Vec<String>,
    pub project_references: Option<Vec<BTreeMap<String, String>>>,
}

/// Which flavour of target a [`Target`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// `PBXNativeTarget`: compiles sources into a product.
    Native,
    /// `PBXAggregateTarget`: groups other targets, has no product.
    Aggregate,
    /// `PBXLegacyTarget`: runs an external build tool.
    Legacy,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Native => "PBXNativeTarget",
            TargetKind::Aggregate => "PBXAggregateTarget",
            TargetKind::Legacy => "PBXLegacyTarget",
        }
    }
}

/// A buildable unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub identifier: String,
    pub kind: TargetKind,
    pub name: String,
    /// Identifiers of `PBXTargetDependency` (or directly referenced) objects.
    pub dependencies: Vec<String>,
    /// Native targets only.
    pub product_reference: Option<String>,
    pub package_product_dependencies: Vec<String>,
    pub build_phases: Vec<String>,
    pub build_configuration_list: Option<String>,
    pub product_name: Option<String>,
    pub product_type: Option<String>,
    pub product_install_path: Option<String>,
    pub comments: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTarget {
    name: String,
    dependencies: Vec<String>,
    product_reference: Option<String>,
    #[serde(default)]
    package_product_dependencies: Vec<String>,
    build_phases: Option<Vec<String>>,
    build_configuration_list: Option<String>,
    product_name: Option<String>,
    product_type: Option<String>,
    product_install_path: Option<String>,
    comments: Option<String>,
}

/// `PBXTargetDependency`: an edge whose far end is a target, a proxy, or a package product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDependencyRecord {
    pub target: Option<String>,
    pub target_proxy: Option<String>,
    pub product_ref: Option<String>,
    pub name: Option<String>,
}

/// `PBXContainerItemProxy`: an indirection to an object, possibly in another project.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerItemProxy {
    pub container_portal: String,
    #[serde(rename = "remoteGlobalIDString")]
    pub remote_global_id: String,
    pub proxy_type: Option<String>,
    pub remote_info: Option<String>,
}

/// `XCSwiftPackageProductDependency`: a product of an external package.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageProductDependency {
    pub product_name: String,
    pub package: Option<String>,
}

/// `PBXFileReference`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub path: Option<String>,
    pub name: Option<String>,
    pub explicit_file_type: Option<String>,
    pub last_known_file_type: Option<String>,
    pub source_tree: Option<String>,
}

impl FileReference {
    /// Display name: the path, falling back to the name.
    pub fn display_name(&self) -> Option<&str> {
        self.path.as_deref().or(self.name.as_deref())
    }
}

/// `PBXGroup` or `PBXVariantGroup` (grouped resources).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub children: Vec<String>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub source_tree: Option<String>,
}

/// Any of the build phase kinds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPhase {
    #[serde(default)]
    pub files: Vec<String>,
    pub name: Option<String>,
}

/// `XCBuildConfiguration`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfiguration {
    pub name: Option<String>,
    #[serde(default)]
    pub build_settings: BTreeMap<String, Value>,
    pub base_configuration_reference: Option<String>,
}

/// `XCConfigurationList`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationList {
    pub build_configurations: Vec<String>,
    pub default_configuration_name: Option<String>,
    pub default_configuration_is_visible: Option<String>,
}

const BUILD_PHASE_KINDS: &[&str] = &[
    "PBXSourcesBuildPhase",
    "PBXFrameworksBuildPhase",
    "PBXResourcesBuildPhase",
    "PBXHeadersBuildPhase",
    "PBXCopyFilesBuildPhase",
    "PBXShellScriptBuildPhase",
];

/// Fields only kept in verbose mode, per kind.
fn diagnostic_fields(isa: &str) -> &'static [&'static str] {
    match isa {
        "PBXNativeTarget" | "PBXAggregateTarget" | "PBXLegacyTarget" => &[
            "productName",
            "productType",
            "productInstallPath",
            "comments",
        ],
        "PBXProject" => &[
            "compatibilityVersion",
            "developmentRegion",
            "knownRegions",
            "projectReferences",
        ],
        "XCBuildConfiguration" => &["buildSettings", "name"],
        "XCConfigurationList" => &["defaultConfigurationName", "defaultConfigurationIsVisible"],
        "PBXVariantGroup" => &["name", "sourceTree"],
        _ => &[],
    }
}

/// Decode every record of the flat object table.
///
/// Unknown kinds decode to [`ObjectKind::Other`]; only a record of a known
/// kind with a missing or malformed required field fails the whole decode.
pub fn decode_objects(
    table: &Map<String, Value>,
    opts: DecodeOptions,
) -> Result<Objects, DecodeError> {
    let mut objects = Objects::new();
    for (identifier, record) in table {
        let object = decode_object(identifier, record, opts)?;
        objects.insert(identifier.clone(), object);
    }
    tracing::debug!("decoded {} project objects", objects.len());
    Ok(objects)
}

/// Decode a single record.
pub fn decode_object(
    identifier: &str,
    record: &Value,
    opts: DecodeOptions,
) -> Result<ProjectObject, DecodeError> {
    let fail = |isa: &str, message: String| DecodeError {
        identifier: identifier.to_string(),
        isa: isa.to_string(),
        message,
    };

    let Some(fields) = record.as_object() else {
        return Err(fail("record", "expected a dictionary".to_string()));
    };
    let Some(isa) = fields.get("isa").and_then(Value::as_str) else {
        return Err(fail("record", "missing `isa` discriminant".to_string()));
    };

    let mut fields = fields.clone();
    if !opts.verbose {
        for key in diagnostic_fields(isa) {
            fields.remove(*key);
        }
    }

    let kind = decode_kind(isa, identifier, fields).map_err(|m| fail(isa, m))?;

    Ok(ProjectObject {
        identifier: identifier.to_string(),
        isa: isa.to_string(),
        kind,
    })
}

fn decode_kind(
    isa: &str,
    identifier: &str,
    fields: Map<String, Value>,
) -> Result<ObjectKind, String> {
    let kind = match isa {
        "PBXProject" => ObjectKind::Project(typed(fields)?),
        "PBXNativeTarget" => ObjectKind::Target(target(TargetKind::Native, identifier, fields)?),
        "PBXAggregateTarget" => {
            ObjectKind::Target(target(TargetKind::Aggregate, identifier, fields)?)
        }
        "PBXLegacyTarget" => ObjectKind::Target(target(TargetKind::Legacy, identifier, fields)?),
        "PBXTargetDependency" => ObjectKind::TargetDependency(typed(fields)?),
        "PBXContainerItemProxy" => ObjectKind::ContainerItemProxy(typed(fields)?),
        "XCSwiftPackageProductDependency" => ObjectKind::PackageProduct(typed(fields)?),
        "PBXFileReference" => ObjectKind::FileReference(typed(fields)?),
        "PBXGroup" | "PBXVariantGroup" => ObjectKind::Group(typed(fields)?),
        "XCBuildConfiguration" => ObjectKind::BuildConfiguration(typed(fields)?),
        "XCConfigurationList" => ObjectKind::ConfigurationList(typed(fields)?),
        kind if BUILD_PHASE_KINDS.contains(&kind) => ObjectKind::BuildPhase(typed(fields)?),
        _ => ObjectKind::Other,
    };
    Ok(kind)
}

fn typed<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| e.to_string())
}

fn target(
    kind: TargetKind,
    identifier: &str,
    fields: Map<String, Value>,
) -> Result<Target, String> {
    let raw: RawTarget = typed(fields)?;

    if kind == TargetKind::Aggregate && raw.build_phases.is_none() {
        return Err("missing field `buildPhases`".to_string());
    }

    Ok(Target {
        identifier: identifier.to_string(),
        kind,
        name: raw.name,
        dependencies: raw.dependencies,
        product_reference: match kind {
            TargetKind::Native => raw.product_reference,
            TargetKind::Aggregate | TargetKind::Legacy => None,
        },
        package_product_dependencies: raw.package_product_dependencies,
        build_phases: raw.build_phases.unwrap_or_default(),
        build_configuration_list: raw.build_configuration_list,
        product_name: raw.product_name,
        product_type: raw.product_type,
        product_install_path: raw.product_install_path,
        comments: raw.comments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_decodes_known_and_unknown_kinds() {
        let objects = decode_objects(
            &table(json!({
                "T1": {
                    "isa": "PBXNativeTarget",
                    "name": "Core",
                    "dependencies": [],
                    "productReference": "F1",
                },
                "F1": {"isa": "PBXFileReference", "path": "Core.framework"},
                "B1": {"isa": "PBXBuildFile", "fileRef": "F1"},
                "R1": {"isa": "PBXReferenceProxy", "path": "libFoo.a"},
            })),
            DecodeOptions::default(),
        )
        .unwrap();

        // Every record survives, recognized or not.
        assert_eq!(objects.len(), 4);
        assert_eq!(objects.values().filter(|o| o.is_recognized()).count(), 2);

        let other = &objects["B1"];
        assert_eq!(other.identifier(), "B1");
        assert_eq!(other.isa(), "PBXBuildFile");
        assert_eq!(other.kind(), &ObjectKind::Other);

        let target = objects["T1"].as_target().unwrap();
        assert_eq!(target.kind, TargetKind::Native);
        assert_eq!(target.product_reference.as_deref(), Some("F1"));
    }

    #[test]
    fn test_missing_required_field_names_identifier() {
        let err = decode_objects(
            &table(json!({"T1": {"isa": "PBXNativeTarget", "dependencies": []}})),
            DecodeOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.identifier, "T1");
        assert_eq!(err.isa, "PBXNativeTarget");
        assert!(err.message.contains("name"), "{}", err.message);
    }

    #[test]
    fn test_aggregate_requires_build_phases() {
        let err = decode_object(
            "A1",
            &json!({"isa": "PBXAggregateTarget", "name": "All", "dependencies": []}),
            DecodeOptions::default(),
        )
        .unwrap_err();
        assert!(err.message.contains("buildPhases"));
    }

    #[test]
    fn test_aggregate_ignores_product_reference() {
        let object = decode_object(
            "A1",
            &json!({
                "isa": "PBXAggregateTarget",
                "name": "All",
                "dependencies": [],
                "buildPhases": [],
                "productReference": "F9",
            }),
            DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(object.as_target().unwrap().product_reference, None);
    }

    #[test]
    fn test_missing_isa_is_an_error() {
        let err = decode_object("X", &json!({"name": "x"}), DecodeOptions::default()).unwrap_err();
        assert!(err.message.contains("isa"));
    }

    #[test]
    fn test_verbose_gate_on_diagnostic_fields() {
        let record = json!({
            "isa": "PBXNativeTarget",
            "name": "App",
            "dependencies": [],
            "productType": "com.apple.product-type.application",
            "comments": ["not", "a", "string"],
        });

        // Malformed diagnostic fields don't matter when they're not decoded.
        let quiet = decode_object("T", &record, DecodeOptions { verbose: false }).unwrap();
        assert_eq!(quiet.as_target().unwrap().product_type, None);

        let err = decode_object("T", &record, DecodeOptions { verbose: true }).unwrap_err();
        assert!(err.message.contains("string"), "{}", err.message);

        let mut record = record;
        record.as_object_mut().unwrap().remove("comments");
        let verbose = decode_object("T", &record, DecodeOptions { verbose: true }).unwrap();
        assert_eq!(
            verbose.as_target().unwrap().product_type.as_deref(),
            Some("com.apple.product-type.application")
        );
    }

    #[test]
    fn test_optional_fields_absent() {
        let object = decode_object(
            "D1",
            &json!({"isa": "PBXTargetDependency"}),
            DecodeOptions::default(),
        )
        .unwrap();
        match object.kind() {
            ObjectKind::TargetDependency(dep) => {
                assert!(dep.target.is_none());
                assert!(dep.target_proxy.is_none());
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }
}
