//! Declarative attribute model for Graph-backed resources
//!
//! Every resource module describes its entity as a [`Schema`]: snake_case attribute
//! names, their kinds, presence flags, validators, defaults and plan modifiers. The
//! generic layer walks the same schema to validate configuration, plan changes and
//! translate between the declarative model and Graph JSON.

pub mod naming;
pub mod validators;

pub use validators::{validate_config, Diagnostic, Severity, Validator};

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute set of one object level (a resource, or a nested object type)
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    #[serde(skip_serializing_if = "is_empty_str")]
    pub description: &'static str,

    /// Fixed `@odata.type` sent with every object of this type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<&'static str>,

    pub attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new(description: &'static str) -> Self {
        Self {
            description,
            odata_type: None,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    /// Add every attribute of `other` (shared fragments such as timestamps).
    /// A fixed odata type on `other` wins.
    #[must_use]
    pub fn extend(mut self, other: Schema) -> Self {
        self.attributes.extend(other.attributes);
        if other.odata_type.is_some() {
            self.odata_type = other.odata_type;
        }
        self
    }

    #[must_use]
    pub fn odata_type(mut self, odata_type: &'static str) -> Self {
        self.odata_type = Some(odata_type);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Attributes that are not derived-type branches
    pub fn base_attributes(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.derived_type.is_none())
            .map(|(n, a)| (*n, a))
    }

    /// Derived-type branches declared at this level
    pub fn derived_attributes(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.derived_type.is_some())
            .map(|(n, a)| (*n, a))
    }

    pub fn has_derived_types(&self) -> bool {
        self.derived_attributes().next().is_some()
    }

    /// Find the branch whose odata type matches `odata_type` (case-insensitive)
    pub fn derived_branch_for(&self, odata_type: &str) -> Option<(&'static str, &Attribute)> {
        self.derived_attributes().find(|(_, a)| {
            a.derived_type
                .is_some_and(|t| t.eq_ignore_ascii_case(odata_type))
        })
    }

    /// Copy of this schema where every attribute is computed and carries no
    /// validators, defaults or plan modifiers. Used to derive data sources.
    pub fn into_computed(self) -> Schema {
        let attributes = self
            .attributes
            .into_iter()
            .map(|(name, attr)| (name, attr.into_computed()))
            .collect();

        Schema {
            description: self.description,
            odata_type: self.odata_type,
            attributes,
        }
    }

    /// Machine-readable schema document
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Scalar element type of list/set attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    String,
    Bool,
    Int64,
    Float64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Bool,
    Int64,
    Float64,
    List(ElementKind),
    Set(ElementKind),
    SingleNested(Schema),
    ListNested(Schema),
    SetNested(Schema),
}

impl AttributeKind {
    pub fn nested_schema(&self) -> Option<&Schema> {
        match self {
            Self::SingleNested(s) | Self::ListNested(s) | Self::SetNested(s) => Some(s),
            _ => None,
        }
    }

    /// Sets compare without regard to element order
    pub fn is_unordered(&self) -> bool {
        matches!(self, Self::Set(_) | Self::SetNested(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    /// Keep the prior state value instead of planning "known after apply"
    UseStateForUnknown,
    /// Any change to the value replaces the resource
    RequiresReplace,
    /// Like `RequiresReplace`, but only when the value is set in configuration
    RequiresReplaceIfConfigured,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub kind: AttributeKind,

    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub computed: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub sensitive: bool,

    /// Graph never returns this value; state keeps what was planned
    #[serde(skip_serializing_if = "is_false")]
    pub write_only: bool,

    #[serde(skip_serializing_if = "is_empty_str")]
    pub description: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_name: Option<&'static str>,

    /// Replacement advice; configuring the attribute yields a warning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_type: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<PlanModifier>,
}

impl Attribute {
    fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            write_only: false,
            description: "",
            graph_name: None,
            deprecation: None,
            derived_type: None,
            default: None,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeKind::String)
    }

    pub fn bool() -> Self {
        Self::new(AttributeKind::Bool)
    }

    pub fn int64() -> Self {
        Self::new(AttributeKind::Int64)
    }

    pub fn float64() -> Self {
        Self::new(AttributeKind::Float64)
    }

    pub fn set(element: ElementKind) -> Self {
        Self::new(AttributeKind::Set(element))
    }

    pub fn list(element: ElementKind) -> Self {
        Self::new(AttributeKind::List(element))
    }

    pub fn single_nested(schema: Schema) -> Self {
        Self::new(AttributeKind::SingleNested(schema))
    }

    pub fn list_nested(schema: Schema) -> Self {
        Self::new(AttributeKind::ListNested(schema))
    }

    pub fn set_nested(schema: Schema) -> Self {
        Self::new(AttributeKind::SetNested(schema))
    }

    /// Branch of an odata derived-type hierarchy. When set, its attributes are
    /// flattened into the parent object and `@odata.type` is sent alongside.
    pub fn derived(odata_type: &'static str, schema: Schema) -> Self {
        let mut attr = Self::single_nested(schema).optional();
        attr.derived_type = Some(odata_type);
        attr
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn graph_name(mut self, graph_name: &'static str) -> Self {
        self.graph_name = Some(graph_name);
        self
    }

    #[must_use]
    pub fn deprecated(mut self, advice: &'static str) -> Self {
        self.deprecation = Some(advice);
        self
    }

    /// Value planned when configuration leaves the attribute null
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.optional = true;
        self.required = false;
        self.computed = true;
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    #[must_use]
    pub fn plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    /// Property name of this attribute in Graph JSON
    pub fn graph_key(&self, name: &str) -> String {
        match self.graph_name {
            Some(graph_name) => graph_name.to_string(),
            None => naming::snake_to_camel(name),
        }
    }

    /// Computed and not settable from configuration
    pub fn is_read_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    pub fn has_plan_modifier(&self, modifier: PlanModifier) -> bool {
        self.plan_modifiers.contains(&modifier)
    }

    pub fn nested_schema(&self) -> Option<&Schema> {
        self.kind.nested_schema()
    }

    fn into_computed(self) -> Attribute {
        let kind = match self.kind {
            AttributeKind::SingleNested(s) => AttributeKind::SingleNested(s.into_computed()),
            AttributeKind::ListNested(s) => AttributeKind::ListNested(s.into_computed()),
            AttributeKind::SetNested(s) => AttributeKind::SetNested(s.into_computed()),
            other => other,
        };

        Attribute {
            kind,
            required: false,
            optional: false,
            computed: true,
            sensitive: self.sensitive,
            write_only: false,
            description: self.description,
            graph_name: self.graph_name,
            deprecation: self.deprecation,
            derived_type: self.derived_type,
            default: None,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_empty_str(value: &&'static str) -> bool {
    value.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location_schema() -> Schema {
        Schema::new("Named location")
            .attribute("id", Attribute::string().computed())
            .attribute("display_name", Attribute::string().required())
            .attribute(
                "country",
                Attribute::derived(
                    "#microsoft.graph.countryNamedLocation",
                    Schema::new("").attribute(
                        "countries_and_regions",
                        Attribute::set(ElementKind::String).required(),
                    ),
                ),
            )
            .attribute(
                "ip",
                Attribute::derived("#microsoft.graph.ipNamedLocation", Schema::new("")),
            )
    }

    #[test]
    fn test_default_value_implies_optional_computed() {
        let attr = Attribute::bool().default_value(false);
        assert!(attr.optional);
        assert!(attr.computed);
        assert!(!attr.is_read_only());
        assert_eq!(attr.default, Some(json!(false)));
    }

    #[test]
    fn test_graph_key_uses_override() {
        assert_eq!(Attribute::string().graph_key("display_name"), "displayName");
        assert_eq!(
            Attribute::string()
                .graph_name("macOSMinimumVersion")
                .graph_key("macos_minimum_version"),
            "macOSMinimumVersion"
        );
    }

    #[test]
    fn test_derived_branch_lookup() {
        let schema = location_schema();
        assert!(schema.has_derived_types());
        assert_eq!(schema.base_attributes().count(), 2);

        let (name, _) = schema
            .derived_branch_for("#microsoft.graph.IPNamedLocation")
            .expect("branch");
        assert_eq!(name, "ip");
        assert!(schema.derived_branch_for("#microsoft.graph.user").is_none());
    }

    #[test]
    fn test_into_computed_strips_constraints() {
        let schema = location_schema().into_computed();
        let display_name = schema.get("display_name").unwrap();
        assert!(display_name.is_read_only());

        let country = schema.get("country").unwrap();
        assert_eq!(country.derived_type, Some("#microsoft.graph.countryNamedLocation"));
        let nested = country.nested_schema().unwrap();
        assert!(nested.get("countries_and_regions").unwrap().is_read_only());
    }

    #[test]
    fn test_schema_to_json() {
        let doc = location_schema().to_json().unwrap();
        assert_eq!(doc["attributes"]["display_name"]["required"], json!(true));
        assert_eq!(doc["attributes"]["display_name"]["kind"], json!("string"));
        assert!(doc["attributes"]["id"].get("required").is_none());
    }
}
