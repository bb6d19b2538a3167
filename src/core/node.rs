//! Component trait and component schemas.
//!
//! The Component trait is the core abstraction for all image operations.
//! Each component pairs an immutable [`ComponentSchema`] (what the host
//! renders and validates against) with a single `execute` entry point.

use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::ComponentResult;
use crate::core::port::{ParameterDefinition, PortDefinition};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Namespace every built-in component is published under.
pub const NAMESPACE: &str = "pixelblocks";

/// Category for organizing components in the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Geometry changes (rotate, extract, trim, extend, resize)
    Transform,
    /// Blur effects
    Blur,
    /// Color adjustments (tint, grayscale, modulate)
    Color,
    /// Channel manipulation (extract channel, alpha handling)
    Channel,
    /// Compositing operations
    Composite,
    /// Analysis and measurement
    Analyze,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Transform => "Transform",
            Category::Blur => "Blur",
            Category::Color => "Color",
            Category::Channel => "Channel",
            Category::Composite => "Composite",
            Category::Analyze => "Analyze",
        }
    }

    /// Get all categories in display order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Transform,
            Category::Blur,
            Category::Color,
            Category::Channel,
            Category::Composite,
            Category::Analyze,
        ]
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Transform
    }
}

/// Schema describing a component.
///
/// This struct contains all information needed to:
/// - Display the component in the host UI
/// - Fill parameter defaults before execution
/// - Document the operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSchema {
    /// Namespace the component is published under
    pub namespace: String,
    /// Operation key (e.g., "rotate")
    pub key: String,
    /// Human-readable title (e.g., "Rotate Image")
    pub title: String,
    /// Category for UI organization
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Documentation links, title to URL
    pub links: IndexMap<String, String>,

    /// Image sequences read from the payload
    pub inputs: Vec<PortDefinition>,
    /// Fields written to the result payload
    pub outputs: Vec<PortDefinition>,
    /// Parameter definitions
    pub parameters: Vec<ParameterDefinition>,

    /// Searchable tags
    pub tags: Vec<String>,
}

impl ComponentSchema {
    /// Create a new schema builder.
    pub fn builder(key: impl Into<String>, title: impl Into<String>) -> ComponentSchemaBuilder {
        ComponentSchemaBuilder::new(key, title)
    }

    /// Get all input port names.
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|p| p.name.as_str()).collect()
    }

    /// Get all parameter names.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Find a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Name of the result field (`images`, `metadata` or `stats`).
    pub fn result_field(&self) -> &str {
        self.outputs
            .first()
            .map(|p| p.name.as_str())
            .unwrap_or("images")
    }

    /// Fill every absent or `null` parameter that declares a default.
    ///
    /// Present values are never touched, even when they violate a declared
    /// constraint.
    pub fn apply_defaults(&self, payload: &mut Payload) {
        for param in &self.parameters {
            if let Some(default) = &param.default_value {
                if !payload.contains(&param.name) {
                    payload.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    /// Render the schema in the host's registration shape.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for port in &self.inputs {
            properties.insert(port.name.clone(), port.to_property());
            if port.required {
                required.push(json!(port.name));
            }
        }
        for param in &self.parameters {
            properties.insert(param.name.clone(), param.to_property());
            if param.required {
                required.push(json!(param.name));
            }
        }

        let mut response = Map::new();
        let mut response_required = Vec::new();
        for port in &self.outputs {
            response.insert(port.name.clone(), port.to_property());
            if port.required {
                response_required.push(json!(port.name));
            }
        }

        json!({
            "namespace": self.namespace,
            "componentKey": self.key,
            "title": self.title,
            "description": self.description,
            "category": self.category.display_name(),
            "tags": self.tags,
            "operation": {
                "schema": {
                    "title": self.title,
                    "type": "object",
                    "required": required,
                    "properties": properties,
                },
                "responseTypes": {
                    "200": {
                        "schema": {
                            "required": response_required,
                            "properties": response,
                        },
                        "contentType": "application/json",
                    }
                },
                "method": "X-CUSTOM",
            },
            "meta": {
                "source": {
                    "summary": self.description,
                    "links": self.links,
                }
            }
        })
    }
}

/// Builder for ComponentSchema.
pub struct ComponentSchemaBuilder {
    namespace: String,
    key: String,
    title: String,
    category: Category,
    description: String,
    links: IndexMap<String, String>,
    inputs: Vec<PortDefinition>,
    outputs: Vec<PortDefinition>,
    parameters: Vec<ParameterDefinition>,
    tags: Vec<String>,
}

impl ComponentSchemaBuilder {
    /// Create a new builder with required fields.
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            namespace: NAMESPACE.to_string(),
            key: key.into(),
            title: title.into(),
            category: Category::default(),
            description: String::new(),
            links: IndexMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a documentation link.
    pub fn link(mut self, title: impl Into<String>, url: impl Into<String>) -> Self {
        self.links.insert(title.into(), url.into());
        self
    }

    /// Add an input port.
    pub fn input(mut self, port: PortDefinition) -> Self {
        self.inputs.push(port);
        self
    }

    /// Add an output port.
    pub fn output(mut self, port: PortDefinition) -> Self {
        self.outputs.push(port);
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add multiple tags.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(|t| t.into()));
        self
    }

    /// Build the schema.
    pub fn build(self) -> ComponentSchema {
        ComponentSchema {
            namespace: self.namespace,
            key: self.key,
            title: self.title,
            category: self.category,
            description: self.description,
            links: self.links,
            inputs: self.inputs,
            outputs: self.outputs,
            parameters: self.parameters,
            tags: self.tags,
        }
    }
}

/// The core trait for image components.
///
/// # Design
///
/// A component is stateless: `schema` describes it and `execute` runs one
/// invocation against a payload. Defaults declared in the schema are filled
/// by the registry before `execute` is called, so `execute` may rely on
/// every defaulted parameter being present.
///
/// # Thread Safety
///
/// `Send + Sync` bounds let one registry serve concurrent invocations.
///
/// # Example Implementation
///
/// ```ignore
/// struct Rotate;
///
/// impl Component for Rotate {
///     fn schema(&self) -> ComponentSchema {
///         ComponentSchema::builder("rotate", "Rotate Image")
///             .category(Category::Transform)
///             .input(PortDefinition::input("images", ParamType::ImageArray))
///             .output(PortDefinition::output("images", ParamType::ImageArray))
///             .parameter(
///                 ParameterDefinition::new("angle", ParamType::Number, json!(90))
///                     .with_range(-360.0, 360.0)
///             )
///             .build()
///     }
///
///     fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
///         transform_images(payload, ctx, |p| {
///             Ok(ops::Rotate::new(p.get_float("angle").unwrap_or(90.0), Color::BLACK))
///         })
///     }
/// }
/// ```
pub trait Component: Send + Sync {
    /// Get the schema for this component.
    ///
    /// This is called during registration and should return consistent values.
    fn schema(&self) -> ComponentSchema;

    /// Run one invocation.
    ///
    /// Returns the payload unchanged when it carries no images.
    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload>;
}
