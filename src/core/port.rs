//! Port and parameter definitions for component schemas.
//!
//! Ports are the image sequences a component consumes and produces.
//! Parameters are the scalar operation settings taken from the payload.
//! Both are rendered into the host's JSON-Schema shape by
//! [`crate::core::node::ComponentSchema::to_json`].

use crate::core::types::ParamType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Direction of a port (input or output).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// Definition of an image sequence a component reads or writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDefinition {
    /// Payload field name (e.g. `images`)
    pub name: String,
    /// Human-readable name (used in UI)
    pub display_name: String,
    /// Type of data carried by the port
    pub port_type: ParamType,
    /// Direction (input or output)
    pub direction: PortDirection,
    /// Whether the field must be present for the operation to run
    pub required: bool,
    /// Description for documentation and tooltips
    pub description: String,
}

/// UI hints for parameter display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "widget", content = "options")]
pub enum UiHint {
    /// Default input widget based on type
    Default,
    /// Slider for numeric values
    Slider {
        /// Whether to use logarithmic scale
        logarithmic: bool,
    },
    /// Dropdown for selecting from options
    Dropdown,
    /// Color picker widget
    ColorPicker,
    /// Checkbox for booleans
    Checkbox,
    /// Spin box for integers
    SpinBox,
    /// Angle input (with circular widget)
    Angle,
}

impl UiHint {
    /// Name of the host control used to render this hint.
    pub fn control(&self) -> Option<&'static str> {
        match self {
            UiHint::Default => None,
            UiHint::Slider { .. } | UiHint::Angle => Some("AlpineNumWithSliderComponent"),
            UiHint::Dropdown => Some("AlpineSelectComponent"),
            UiHint::ColorPicker => Some("AlpineColorComponent"),
            UiHint::Checkbox => Some("AlpineToggleComponent"),
            UiHint::SpinBox => Some("AlpineNumComponent"),
        }
    }
}

impl Default for UiHint {
    fn default() -> Self {
        UiHint::Default
    }
}

/// Definition of an operation parameter.
///
/// Parameters are flat payload fields. The declared default fills absent
/// fields before the operation runs; constraints are advertised to the host
/// but not enforced here. Out-of-range values travel on to the image
/// operation, which rejects what it cannot handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Payload field name
    pub name: String,
    /// Human-readable name
    pub display_name: String,
    /// Type of the parameter
    pub param_type: ParamType,
    /// Default value, if the parameter has one
    pub default_value: Option<Value>,
    /// Whether the host must supply the parameter
    pub required: bool,
    /// Description for documentation
    pub description: String,
    /// Advertised constraints
    pub constraints: Vec<Constraint>,
    /// UI widget hint
    pub ui_hint: UiHint,
}

/// Constraints that can be advertised for parameter values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "params")]
pub enum Constraint {
    /// Numeric value must be within range [min, max]
    Range { min: f64, max: f64 },
    /// Numeric value must be >= min
    MinValue(f64),
    /// Value must be one of the specified options
    OneOf(Vec<Value>),
}

impl Constraint {
    /// Write this constraint's JSON-Schema keywords into `property`.
    fn annotate(&self, property: &mut Map<String, Value>) {
        match self {
            Constraint::Range { min, max } => {
                property.insert("minimum".to_string(), json!(min));
                property.insert("maximum".to_string(), json!(max));
            }
            Constraint::MinValue(min) => {
                property.insert("minimum".to_string(), json!(min));
            }
            Constraint::OneOf(options) => {
                property.insert("enum".to_string(), Value::Array(options.clone()));
            }
        }
    }
}

/// Convert camelCase or snake_case field names to a Title Case display name.
fn name_to_display(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in name.chars() {
        if ch == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// PortDefinition Builder Pattern
// ============================================================================

impl PortDefinition {
    /// Create a new required input port carrying images.
    pub fn input(name: impl Into<String>, port_type: ParamType) -> Self {
        let name = name.into();
        Self {
            display_name: name_to_display(&name),
            name,
            port_type,
            direction: PortDirection::Input,
            required: true,
            description: String::new(),
        }
    }

    /// Create a new output port.
    pub fn output(name: impl Into<String>, port_type: ParamType) -> Self {
        let name = name.into();
        Self {
            display_name: name_to_display(&name),
            name,
            port_type,
            direction: PortDirection::Output,
            required: true,
            description: String::new(),
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark this port as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Render as a JSON-Schema property.
    pub fn to_property(&self) -> Value {
        let mut property = Map::new();
        property.insert("title".to_string(), json!(self.display_name));
        property.insert("type".to_string(), json!(self.port_type.json_type()));
        if let Some(x_type) = self.port_type.x_type() {
            property.insert("x-type".to_string(), json!(x_type));
        }
        if !self.description.is_empty() {
            property.insert("description".to_string(), json!(self.description));
        }
        Value::Object(property)
    }
}

// ============================================================================
// ParameterDefinition Builder Pattern
// ============================================================================

impl ParameterDefinition {
    /// Create a parameter with a default value.
    pub fn new(name: impl Into<String>, param_type: ParamType, default_value: Value) -> Self {
        let name = name.into();
        Self {
            display_name: name_to_display(&name),
            name,
            param_type,
            default_value: Some(default_value),
            required: false,
            description: String::new(),
            constraints: Vec::new(),
            ui_hint: UiHint::Default,
        }
    }

    /// Create a required parameter without a default.
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        let name = name.into();
        Self {
            display_name: name_to_display(&name),
            name,
            param_type,
            default_value: None,
            required: true,
            description: String::new(),
            constraints: Vec::new(),
            ui_hint: UiHint::Default,
        }
    }

    /// Create an optional parameter without a default.
    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        let mut param = Self::required(name, param_type);
        param.required = false;
        param
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a range constraint and set UI hint to slider.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.constraints.push(Constraint::Range { min, max });
        if matches!(self.ui_hint, UiHint::Default) {
            self.ui_hint = UiHint::Slider { logarithmic: false };
        }
        self
    }

    /// Add a lower bound.
    pub fn with_min(mut self, min: f64) -> Self {
        self.constraints.push(Constraint::MinValue(min));
        self
    }

    /// Restrict to a set of string choices and render as a dropdown.
    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.constraints.push(Constraint::OneOf(
            choices.iter().map(|c| Value::String((*c).to_string())).collect(),
        ));
        self.ui_hint = UiHint::Dropdown;
        self
    }

    /// Add a constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Set the UI hint.
    pub fn with_ui_hint(mut self, ui_hint: UiHint) -> Self {
        self.ui_hint = ui_hint;
        self
    }

    /// Allowed string choices, if the parameter is an enum.
    pub fn choices(&self) -> Option<Vec<&str>> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::OneOf(options) => Some(options.iter().filter_map(Value::as_str).collect()),
            _ => None,
        })
    }

    /// Render as a JSON-Schema property.
    pub fn to_property(&self) -> Value {
        let mut property = Map::new();
        property.insert("title".to_string(), json!(self.display_name));
        property.insert("type".to_string(), json!(self.param_type.json_type()));
        if let Some(default) = &self.default_value {
            property.insert("default".to_string(), default.clone());
        }
        if !self.description.is_empty() {
            property.insert("description".to_string(), json!(self.description));
        }
        for constraint in &self.constraints {
            constraint.annotate(&mut property);
        }
        if let Some(control) = self.ui_hint.control() {
            property.insert("control".to_string(), json!({ "type": control }));
        }
        Value::Object(property)
    }
}
