//! Property construction and patching.
//!
//! Constraint references are stored as local names of the owning model's
//! constraints and rendered with its current prefix on every read.

use std::collections::{BTreeMap, BTreeSet};

use cmm_catalog::model::uris::D_BOOLEAN;
use cmm_catalog::ValueCheck;

use crate::constraint::{self, Constraint, NewConstraint};
use crate::error::{Conflict, RegistryError, ValidationError};
use crate::names::{self, QualifiedName};
use crate::resolver::Resolver;
use crate::types::{Facetable, NewProperty, Property, PropertyPatch};

/// The constraints a property of one model may use or declare.
#[derive(Debug)]
pub struct ConstraintScope<'a> {
    /// Owning model.
    pub model: &'a str,
    /// The model's current prefix.
    pub prefix: &'a str,
    /// Model-level constraints by name.
    pub declared: &'a BTreeMap<String, Constraint>,
    /// Inline constraint names already used in the model.
    pub taken: BTreeSet<String>,
}

impl ConstraintScope<'_> {
    /// Maps prefixed references to local names of declared constraints.
    fn resolve_refs(&self, refs: &[String]) -> Result<Vec<String>, RegistryError> {
        refs.iter()
            .map(|reference| {
                let name = QualifiedName::parse(reference)?;
                if name.prefix != self.prefix || !self.declared.contains_key(&name.local) {
                    return Err(Conflict::ConstraintRefNotDefined {
                        model: self.model.to_owned(),
                        reference: reference.clone(),
                    }
                    .into());
                }
                Ok(name.local)
            })
            .collect()
    }

    fn is_free(&self, name: &str) -> bool {
        !self.declared.contains_key(name) && !self.taken.contains(name)
    }

    /// Validates inline constraints, naming anonymous ones
    /// `<property>_anon_<n>`.
    fn build_inline(
        &mut self,
        property: &str,
        requests: Vec<NewConstraint>,
    ) -> Result<Vec<Constraint>, RegistryError> {
        let mut built = Vec::with_capacity(requests.len());
        let mut counter = 0;
        for mut request in requests {
            let name = match request.name.take() {
                Some(name) => name,
                None => loop {
                    let candidate = format!("{property}_anon_{counter}");
                    counter += 1;
                    if self.is_free(&candidate) {
                        break candidate;
                    }
                },
            };
            if !self.is_free(&name) {
                return Err(Conflict::DuplicateConstraint {
                    model: self.model.to_owned(),
                    name,
                }
                .into());
            }
            self.taken.insert(name.clone());
            built.push(constraint::build(request, name, self.prefix)?);
        }
        Ok(built)
    }

    /// Checks every constraint of `property` against its data type and
    /// default value.
    fn check(&self, property: &Property, values: ValueCheck) -> Result<(), RegistryError> {
        let referenced = property
            .constraint_refs
            .iter()
            .filter_map(|name| self.declared.get(name));
        for constraint in referenced.chain(&property.constraints) {
            constraint.check_usage(&property.data_type, values)?;
            if let Some(value) = &property.default_value {
                if constraint.is_violated_by(value) {
                    return Err(Conflict::DefaultValueViolatesConstraint {
                        property: property.name.clone(),
                        constraint: constraint.name.clone(),
                        value: value.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

fn check_default(
    resolver: &Resolver<'_>,
    data_type: &str,
    default_value: Option<&str>,
) -> Result<ValueCheck, ValidationError> {
    let check = resolver.resolve_data_type(data_type)?;
    match default_value {
        Some(value) if !check.accepts(value) => Err(ValidationError::InvalidDefaultValue {
            value: value.to_owned(),
            data_type: data_type.to_owned(),
        }),
        _ => Ok(check),
    }
}

fn facet_for(data_type: &str, requested: Facetable) -> Facetable {
    if data_type == D_BOOLEAN {
        Facetable::Unset
    } else {
        requested
    }
}

/// Inline constraints with prefixed names under `prefix`.
pub(crate) fn rebased(constraints: &[Constraint], prefix: &str) -> Vec<Constraint> {
    constraints
        .iter()
        .cloned()
        .map(|mut c| {
            c.prefixed_name = format!("{prefix}:{}", c.name);
            c
        })
        .collect()
}

/// Validates a property request and fills in defaults.
///
/// # Errors
///
/// - [`ValidationError`] for a bad name, an unqualified or unknown data
///   type, a default value the data type does not accept, a malformed
///   constraint or one that cannot apply to the data type.
/// - [`Conflict::ConstraintRefNotDefined`] for a reference outside the
///   model's own constraints.
/// - [`Conflict::DuplicateConstraint`] for an inline name already in use.
/// - [`Conflict::DefaultValueViolatesConstraint`].
pub fn build(
    request: NewProperty,
    default_data_type: &str,
    resolver: &Resolver<'_>,
    scope: &mut ConstraintScope<'_>,
) -> Result<Property, RegistryError> {
    names::validate_local_name("property name", &request.name)?;
    let data_type = request
        .data_type
        .unwrap_or_else(|| default_data_type.to_owned());
    let values = check_default(resolver, &data_type, request.default_value.as_deref())?;
    let constraint_refs = scope.resolve_refs(&request.constraint_refs)?;
    let constraints = scope.build_inline(&request.name, request.constraints)?;

    let property = Property {
        facetable: facet_for(&data_type, request.facetable),
        name: request.name,
        title: request.title,
        description: request.description,
        data_type,
        mandatory: request.mandatory,
        mandatory_enforced: request.mandatory_enforced,
        multi_valued: request.multi_valued,
        default_value: request.default_value,
        indexed: request.indexed,
        index_tokenisation_mode: request.index_tokenisation_mode,
        constraint_refs,
        constraints,
    };
    scope.check(&property, values)?;
    Ok(property)
}

/// Applies a patch to a copy of `current`.
///
/// While the owning model is active, the structural attributes
/// (`dataType`, `mandatory`, `mandatoryEnforced`, `multiValued`,
/// `constraintRefs`, `constraints`) may be restated but not changed.
/// `scope.taken` must not hold the inline names of `current` itself.
///
/// # Errors
///
/// - [`ValidationError::ImmutableName`] if the patch renames the property.
/// - [`Conflict::ActivePropertyChange`] for a frozen attribute change.
/// - Any error of [`build`] for the resulting property.
pub fn patch(
    current: &Property,
    patch: PropertyPatch,
    model_active: bool,
    resolver: &Resolver<'_>,
    scope: &mut ConstraintScope<'_>,
) -> Result<Property, RegistryError> {
    if let Some(name) = &patch.name {
        if name != &current.name {
            return Err(ValidationError::ImmutableName {
                field: "property name",
                current: current.name.clone(),
                requested: name.clone(),
            }
            .into());
        }
    }

    let refs = patch
        .constraint_refs
        .as_deref()
        .map(|refs| scope.resolve_refs(refs))
        .transpose()?;
    let inline = patch
        .constraints
        .map(|requests| scope.build_inline(&current.name, requests))
        .transpose()?;

    if model_active {
        let frozen = [
            ("dataType", patch.data_type.as_ref().map(|d| d != &current.data_type)),
            ("mandatory", patch.mandatory.map(|m| m != current.mandatory)),
            (
                "mandatoryEnforced",
                patch.mandatory_enforced.map(|m| m != current.mandatory_enforced),
            ),
            ("multiValued", patch.multi_valued.map(|m| m != current.multi_valued)),
            ("constraintRefs", refs.as_ref().map(|r| r != &current.constraint_refs)),
            (
                "constraints",
                inline
                    .as_ref()
                    .map(|c| c != &rebased(&current.constraints, scope.prefix)),
            ),
        ];
        if let Some((attribute, _)) = frozen.iter().find(|(_, changed)| *changed == Some(true)) {
            return Err(Conflict::ActivePropertyChange {
                property: current.name.clone(),
                attribute: *attribute,
            }
            .into());
        }
    }

    let mut next = current.clone();
    if let Some(title) = patch.title {
        next.title = Some(title);
    }
    if let Some(description) = patch.description {
        next.description = Some(description);
    }
    if let Some(data_type) = patch.data_type {
        next.data_type = data_type;
    }
    if let Some(mandatory) = patch.mandatory {
        next.mandatory = mandatory;
    }
    if let Some(enforced) = patch.mandatory_enforced {
        next.mandatory_enforced = enforced;
    }
    if let Some(multi) = patch.multi_valued {
        next.multi_valued = multi;
    }
    if let Some(value) = patch.default_value {
        next.default_value = Some(value);
    }
    if let Some(indexed) = patch.indexed {
        next.indexed = indexed;
    }
    if let Some(facetable) = patch.facetable {
        next.facetable = facetable;
    }
    if let Some(mode) = patch.index_tokenisation_mode {
        next.index_tokenisation_mode = Some(mode);
    }
    if let Some(refs) = refs {
        next.constraint_refs = refs;
    }
    if let Some(inline) = inline {
        next.constraints = inline;
    }

    let values = check_default(resolver, &next.data_type, next.default_value.as_deref())?;
    scope.check(&next, values)?;
    next.facetable = facet_for(&next.data_type, next.facetable);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use cmm_catalog::Catalog;

    use super::*;
    use crate::class_index::ClassIndex;
    use crate::constraint::{ConstraintParameter, ConstraintType};
    use crate::namespace::NamespaceTable;

    fn declared() -> BTreeMap<String, Constraint> {
        let regex = NewConstraint::new("noAngles", ConstraintType::Regex)
            .parameter(ConstraintParameter::simple("expression", ".*[<>].*"))
            .parameter(ConstraintParameter::simple("requiresMatch", "false"));
        let range = NewConstraint::new("percent", ConstraintType::MinMax)
            .parameter(ConstraintParameter::simple("minValue", "0"))
            .parameter(ConstraintParameter::simple("maxValue", "100"));
        [("noAngles", regex), ("percent", range)]
            .into_iter()
            .map(|(name, request)| {
                let built = constraint::build(request, name.to_owned(), "p1").unwrap();
                (name.to_owned(), built)
            })
            .collect()
    }

    fn with_resolver<T>(f: impl FnOnce(&Resolver<'_>, &mut ConstraintScope<'_>) -> T) -> T {
        let ns = NamespaceTable::new();
        let classes = ClassIndex::new();
        let declared = declared();
        let mut scope = ConstraintScope {
            model: "m1",
            prefix: "p1",
            declared: &declared,
            taken: BTreeSet::new(),
        };
        f(&Resolver::new(&ns, &classes, Catalog::standard()), &mut scope)
    }

    #[test]
    fn missing_data_type_uses_default() {
        let p = with_resolver(|r, s| build(NewProperty::new("notes"), "d:text", r, s)).unwrap();
        assert_eq!(p.data_type, "d:text");
        assert!(p.indexed);
    }

    #[test]
    fn unqualified_data_type_rejected() {
        let err = with_resolver(|r, s| build(NewProperty::new("n").data_type("int"), "d:text", r, s))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Validation(ValidationError::UnqualifiedDataType("int".into()))
        );
    }

    #[test]
    fn default_value_must_parse() {
        let err = with_resolver(|r, s| {
            build(
                NewProperty::new("n").data_type("d:int").default_value("ten"),
                "d:text",
                r,
                s,
            )
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::InvalidDefaultValue { .. })
        ));

        let ok = with_resolver(|r, s| {
            build(
                NewProperty::new("n").data_type("d:int").default_value("10"),
                "d:text",
                r,
                s,
            )
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn boolean_is_never_facetable() {
        let p = with_resolver(|r, s| {
            build(
                NewProperty::new("flag")
                    .data_type("d:boolean")
                    .facetable(Facetable::True),
                "d:text",
                r,
                s,
            )
        })
        .unwrap();
        assert_eq!(p.facetable, Facetable::Unset);
    }

    #[test]
    fn active_model_freezes_structure() {
        let current = with_resolver(|r, s| build(NewProperty::new("n"), "d:text", r, s)).unwrap();
        let err = with_resolver(|r, s| {
            patch(
                &current,
                PropertyPatch {
                    mandatory: Some(true),
                    ..PropertyPatch::default()
                },
                true,
                r,
                s,
            )
        })
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict(Conflict::ActivePropertyChange {
                property: "n".into(),
                attribute: "mandatory",
            })
        );

        // Restating the current value and editing the title is fine.
        let next = with_resolver(|r, s| {
            patch(
                &current,
                PropertyPatch {
                    data_type: Some("d:text".into()),
                    constraint_refs: Some(Vec::new()),
                    title: Some("Notes".into()),
                    ..PropertyPatch::default()
                },
                true,
                r,
                s,
            )
        })
        .unwrap();
        assert_eq!(next.title.as_deref(), Some("Notes"));
    }

    #[test]
    fn draft_model_allows_type_change_with_revalidation() {
        let current = with_resolver(|r, s| {
            build(NewProperty::new("n").default_value("abc"), "d:text", r, s)
        })
        .unwrap();
        let err = with_resolver(|r, s| {
            patch(
                &current,
                PropertyPatch {
                    data_type: Some("d:long".into()),
                    ..PropertyPatch::default()
                },
                false,
                r,
                s,
            )
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::InvalidDefaultValue { .. })
        ));
    }

    #[test]
    fn rename_rejected() {
        let current = with_resolver(|r, s| build(NewProperty::new("n"), "d:text", r, s)).unwrap();
        let err = with_resolver(|r, s| {
            patch(
                &current,
                PropertyPatch {
                    name: Some("m".into()),
                    ..PropertyPatch::default()
                },
                false,
                r,
                s,
            )
        })
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    // ── constraints ──────────────────────────────────────────────

    #[test]
    fn refs_are_stored_by_local_name() {
        let p = with_resolver(|r, s| {
            build(NewProperty::new("n").constraint_ref("p1:noAngles"), "d:text", r, s)
        })
        .unwrap();
        assert_eq!(p.constraint_refs, vec!["noAngles".to_owned()]);
    }

    #[test]
    fn refs_must_name_a_constraint_of_the_same_model() {
        for reference in ["p2:noAngles", "p1:missing"] {
            let err = with_resolver(|r, s| {
                build(NewProperty::new("n").constraint_ref(reference), "d:text", r, s)
            })
            .unwrap_err();
            assert_eq!(
                err,
                RegistryError::Conflict(Conflict::ConstraintRefNotDefined {
                    model: "m1".into(),
                    reference: reference.into(),
                })
            );
        }
    }

    #[test]
    fn minmax_ref_only_on_numeric_types() {
        let err = with_resolver(|r, s| {
            build(NewProperty::new("n").constraint_ref("p1:percent"), "d:text", r, s)
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::ConstraintNotApplicable { .. })
        ));
        assert!(with_resolver(|r, s| {
            build(
                NewProperty::new("n").data_type("d:int").constraint_ref("p1:percent"),
                "d:text",
                r,
                s,
            )
        })
        .is_ok());
    }

    #[test]
    fn default_value_must_satisfy_constraints() {
        let err = with_resolver(|r, s| {
            build(
                NewProperty::new("n")
                    .default_value("invalid<defaultValue")
                    .constraint_ref("p1:noAngles"),
                "d:text",
                r,
                s,
            )
        })
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict(Conflict::DefaultValueViolatesConstraint {
                property: "n".into(),
                constraint: "noAngles".into(),
                value: "invalid<defaultValue".into(),
            })
        );

        let inline_length = NewConstraint::anonymous(ConstraintType::Length)
            .parameter(ConstraintParameter::simple("maxLength", "3"));
        let err = with_resolver(|r, s| {
            build(
                NewProperty::new("code").default_value("abcd").constraint(inline_length),
                "d:text",
                r,
                s,
            )
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(Conflict::DefaultValueViolatesConstraint { ref constraint, .. })
                if constraint == "code_anon_0"
        ));
    }

    #[test]
    fn inline_names_are_generated_and_unique() {
        let length = || {
            NewConstraint::anonymous(ConstraintType::Length)
                .parameter(ConstraintParameter::simple("maxLength", "8"))
        };
        let p = with_resolver(|r, s| {
            build(
                NewProperty::new("code").constraint(length()).constraint(length()),
                "d:text",
                r,
                s,
            )
        })
        .unwrap();
        let names: Vec<&str> = p.constraints.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["code_anon_0", "code_anon_1"]);
        assert_eq!(p.constraints[0].prefixed_name, "p1:code_anon_0");

        let clash = NewConstraint {
            name: Some("percent".into()),
            ..length()
        };
        let err = with_resolver(|r, s| {
            build(NewProperty::new("code").constraint(clash), "d:text", r, s)
        })
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict(Conflict::DuplicateConstraint {
                model: "m1".into(),
                name: "percent".into(),
            })
        );
    }

    #[test]
    fn active_model_freezes_constraints() {
        let current = with_resolver(|r, s| build(NewProperty::new("n"), "d:text", r, s)).unwrap();
        let err = with_resolver(|r, s| {
            patch(
                &current,
                PropertyPatch {
                    constraint_refs: Some(vec!["p1:noAngles".into()]),
                    ..PropertyPatch::default()
                },
                true,
                r,
                s,
            )
        })
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict(Conflict::ActivePropertyChange {
                property: "n".into(),
                attribute: "constraintRefs",
            })
        );
    }
}
