//! Public request and view types.
//!
//! Views (`Model`, `ClassDef`, `Property`) are computed on every read, so
//! prefixed names always reflect the owning model's current prefix.
//! Requests (`New*`, `*Patch`) deserialize from the camelCase JSON used by
//! operation scripts.

use cmm_catalog::ClassKind;
use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, NewConstraint};
use crate::lifecycle::ModelStatus;

// ── Models ─────────────────────────────────────────────────────────────

/// A custom model as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Immutable, registry-unique name.
    pub name: String,
    /// Namespace URI.
    pub namespace_uri: String,
    /// Namespace prefix.
    pub namespace_prefix: String,
    /// Lifecycle state.
    pub status: ModelStatus,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Input of `create_model`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewModel {
    /// Model name.
    pub name: String,
    /// Namespace URI.
    pub namespace_uri: String,
    /// Namespace prefix.
    pub namespace_prefix: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional author.
    #[serde(default)]
    pub author: Option<String>,
}

impl NewModel {
    /// A model request with the mandatory fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace_uri: impl Into<String>,
        namespace_prefix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace_uri: namespace_uri.into(),
            namespace_prefix: namespace_prefix.into(),
            description: None,
            author: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Partial update of a model. `None` leaves a field untouched.
///
/// `name` is accepted only so that an attempted rename can be rejected
/// instead of ignored. `namespace_uri` and `namespace_prefix` must be
/// supplied together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelPatch {
    /// Must equal the current name if present.
    #[serde(default)]
    pub name: Option<String>,
    /// New namespace URI.
    #[serde(default)]
    pub namespace_uri: Option<String>,
    /// New namespace prefix.
    #[serde(default)]
    pub namespace_prefix: Option<String>,
    /// Requested lifecycle state.
    #[serde(default)]
    pub status: Option<ModelStatus>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New author.
    #[serde(default)]
    pub author: Option<String>,
}

impl ModelPatch {
    /// Requests a namespace change.
    #[must_use]
    pub fn namespace(mut self, uri: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.namespace_uri = Some(uri.into());
        self.namespace_prefix = Some(prefix.into());
        self
    }

    /// Requests a status change.
    #[must_use]
    pub fn status(mut self, status: ModelStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub(crate) fn touches_metadata(&self) -> bool {
        self.description.is_some() || self.author.is_some()
    }
}

// ── Classes ────────────────────────────────────────────────────────────

/// A custom type or aspect as seen by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDef {
    /// Immutable local name.
    pub name: String,
    /// `prefix:name`, using the owning model's current prefix.
    pub prefixed_name: String,
    /// Type or aspect.
    pub kind: ClassKind,
    /// Owning model.
    pub model: String,
    /// Parent in prefixed form, computed from the parent's current prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Own declared properties. Inherited properties are not listed.
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// Input of `create_class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewClass {
    /// Type or aspect.
    pub kind: ClassKind,
    /// Local name.
    pub name: String,
    /// Parent as `prefix:localName`.
    #[serde(default)]
    pub parent_name: Option<String>,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Properties declared with the class.
    #[serde(default)]
    pub properties: Vec<NewProperty>,
}

impl NewClass {
    /// A class request of the given kind.
    #[must_use]
    pub fn new(kind: ClassKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent_name: None,
            title: None,
            description: None,
            properties: Vec::new(),
        }
    }

    /// A type request.
    #[must_use]
    pub fn type_(name: impl Into<String>) -> Self {
        Self::new(ClassKind::Type, name)
    }

    /// An aspect request.
    #[must_use]
    pub fn aspect(name: impl Into<String>) -> Self {
        Self::new(ClassKind::Aspect, name)
    }

    /// Sets the parent reference.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_name = Some(parent.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn property(mut self, property: NewProperty) -> Self {
        self.properties.push(property);
        self
    }
}

/// Partial update of a class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassPatch {
    /// Must equal the current name if present.
    #[serde(default)]
    pub name: Option<String>,
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New parent as `prefix:localName`.
    #[serde(default)]
    pub parent_name: Option<String>,
    /// Removes the parent. Ignored when `parent_name` is set.
    #[serde(default)]
    pub clear_parent: bool,
}

impl ClassPatch {
    /// Sets a new parent.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_name = Some(parent.into());
        self
    }

    /// Removes the parent.
    #[must_use]
    pub fn clear_parent(mut self) -> Self {
        self.clear_parent = true;
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The parent the patch asks for: `None` leaves it unchanged,
    /// `Some(None)` removes it.
    pub(crate) fn requested_parent(&self) -> Option<Option<&str>> {
        match (&self.parent_name, self.clear_parent) {
            (Some(parent), _) => Some(Some(parent.as_str())),
            (None, true) => Some(None),
            (None, false) => None,
        }
    }
}

/// Lookup result for a local or prefixed class name.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassLookup {
    /// A custom class.
    Custom(ClassDef),
    /// A class of the built-in catalog.
    BuiltIn {
        /// `prefix:name`.
        prefixed_name: String,
        /// Type or aspect.
        kind: ClassKind,
    },
}

impl ClassLookup {
    /// Kind of the class found.
    #[must_use]
    pub fn kind(&self) -> ClassKind {
        match self {
            Self::Custom(class) => class.kind,
            Self::BuiltIn { kind, .. } => *kind,
        }
    }
}

// ── Properties ─────────────────────────────────────────────────────────

/// Whether a property is offered as a search facet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Facetable {
    /// Left to the search configuration.
    #[default]
    Unset,
    /// Always a facet.
    True,
    /// Never a facet.
    False,
}

/// How a text property is tokenised for indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tokenisation {
    /// Tokenised.
    True,
    /// Indexed as a single token.
    False,
    /// Both forms.
    Both,
}

/// A property declared by a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Local name, unique within the class.
    pub name: String,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Prefixed data type (`d:text`, `d:int`, ...).
    pub data_type: String,
    /// A value is required.
    #[serde(default)]
    pub mandatory: bool,
    /// The requirement is enforced on write.
    #[serde(default)]
    pub mandatory_enforced: bool,
    /// Holds a list of values.
    #[serde(default)]
    pub multi_valued: bool,
    /// Literal default, valid for `data_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Included in the search index.
    #[serde(default = "indexed_by_default")]
    pub indexed: bool,
    /// Facet setting.
    #[serde(default)]
    pub facetable: Facetable,
    /// Tokenisation mode, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_tokenisation_mode: Option<Tokenisation>,
    /// Model constraints applied to the value, as `prefix:name`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraint_refs: Vec<String>,
    /// Constraints declared on this property only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl Property {
    /// Names of every constraint the property uses, referenced first.
    pub fn constraint_names(&self) -> impl Iterator<Item = &str> {
        self.constraint_refs
            .iter()
            .map(|r| r.split_once(':').map_or(r.as_str(), |(_, local)| local))
            .chain(self.constraints.iter().map(|c| c.name.as_str()))
    }
}

fn indexed_by_default() -> bool {
    true
}

/// Input of `add_property` and of properties declared with a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProperty {
    /// Local name.
    pub name: String,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Prefixed data type; the configured default when absent.
    #[serde(default)]
    pub data_type: Option<String>,
    /// A value is required.
    #[serde(default)]
    pub mandatory: bool,
    /// The requirement is enforced on write.
    #[serde(default)]
    pub mandatory_enforced: bool,
    /// Holds a list of values.
    #[serde(default)]
    pub multi_valued: bool,
    /// Literal default.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Included in the search index.
    #[serde(default = "indexed_by_default")]
    pub indexed: bool,
    /// Facet setting.
    #[serde(default)]
    pub facetable: Facetable,
    /// Tokenisation mode.
    #[serde(default)]
    pub index_tokenisation_mode: Option<Tokenisation>,
    /// References to constraints of the same model, as `prefix:name`.
    #[serde(default)]
    pub constraint_refs: Vec<String>,
    /// Inline constraints.
    #[serde(default)]
    pub constraints: Vec<NewConstraint>,
}

impl NewProperty {
    /// A property request with defaults for everything but the name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            data_type: None,
            mandatory: false,
            mandatory_enforced: false,
            multi_valued: false,
            default_value: None,
            indexed: true,
            facetable: Facetable::Unset,
            index_tokenisation_mode: None,
            constraint_refs: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Sets the data type.
    #[must_use]
    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Marks the property mandatory.
    #[must_use]
    pub fn mandatory(mut self, enforced: bool) -> Self {
        self.mandatory = true;
        self.mandatory_enforced = enforced;
        self
    }

    /// Marks the property multi-valued.
    #[must_use]
    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the facet setting.
    #[must_use]
    pub fn facetable(mut self, facetable: Facetable) -> Self {
        self.facetable = facetable;
        self
    }

    /// References a model constraint by prefixed name.
    #[must_use]
    pub fn constraint_ref(mut self, reference: impl Into<String>) -> Self {
        self.constraint_refs.push(reference.into());
        self
    }

    /// Adds an inline constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: NewConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

impl From<Property> for NewProperty {
    fn from(p: Property) -> Self {
        Self {
            name: p.name,
            title: p.title,
            description: p.description,
            data_type: Some(p.data_type),
            mandatory: p.mandatory,
            mandatory_enforced: p.mandatory_enforced,
            multi_valued: p.multi_valued,
            default_value: p.default_value,
            indexed: p.indexed,
            facetable: p.facetable,
            index_tokenisation_mode: p.index_tokenisation_mode,
            constraint_refs: p.constraint_refs,
            constraints: p.constraints.into_iter().map(NewConstraint::from).collect(),
        }
    }
}

/// Partial update of a property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertyPatch {
    /// Must equal the current name if present.
    #[serde(default)]
    pub name: Option<String>,
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New data type. Frozen while the model is active.
    #[serde(default)]
    pub data_type: Option<String>,
    /// Frozen while the model is active.
    #[serde(default)]
    pub mandatory: Option<bool>,
    /// Frozen while the model is active.
    #[serde(default)]
    pub mandatory_enforced: Option<bool>,
    /// Frozen while the model is active.
    #[serde(default)]
    pub multi_valued: Option<bool>,
    /// New default value.
    #[serde(default)]
    pub default_value: Option<String>,
    /// New index flag.
    #[serde(default)]
    pub indexed: Option<bool>,
    /// New facet setting.
    #[serde(default)]
    pub facetable: Option<Facetable>,
    /// New tokenisation mode.
    #[serde(default)]
    pub index_tokenisation_mode: Option<Tokenisation>,
    /// Replaces the constraint references. Frozen while the model is active.
    #[serde(default)]
    pub constraint_refs: Option<Vec<String>>,
    /// Replaces the inline constraints. Frozen while the model is active.
    #[serde(default)]
    pub constraints: Option<Vec<NewConstraint>>,
}

// ── Statistics ─────────────────────────────────────────────────────────

/// Counts over active models only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfo {
    /// Number of active models.
    pub active_models: usize,
    /// Types owned by active models.
    pub active_types: usize,
    /// Aspects owned by active models.
    pub active_aspects: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_property_defaults_from_json() {
        let p: NewProperty = serde_json::from_str(r#"{"name":"amount"}"#).unwrap();
        assert_eq!(p, NewProperty::new("amount"));
        assert!(p.indexed);
        assert_eq!(p.facetable, Facetable::Unset);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let err = serde_json::from_str::<ModelPatch>(r#"{"namespace":"x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn class_patch_parent_request() {
        assert_eq!(ClassPatch::default().requested_parent(), None);
        assert_eq!(
            ClassPatch::default().clear_parent().requested_parent(),
            Some(None)
        );
        assert_eq!(
            ClassPatch::default()
                .clear_parent()
                .parent("p1:base")
                .requested_parent(),
            Some(Some("p1:base"))
        );
    }

    #[test]
    fn model_serializes_camel_case() {
        let model = Model {
            name: "m1".into(),
            namespace_uri: "u1".into(),
            namespace_prefix: "p1".into(),
            status: ModelStatus::Draft,
            description: None,
            author: None,
        };
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["namespacePrefix"], "p1");
        assert_eq!(json["status"], "DRAFT");
        assert!(json.get("author").is_none());
    }
}
