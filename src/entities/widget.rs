//! Widget model: one user-adjustable control on a node.
//!
//! A widget carries its current value, how it renders ([`WidgetKind`]) and
//! how much vertical space it claims ([`SizeRule`]). Hiding swaps both for
//! collapsed placeholders; the originals live in [`WidgetOrigin`] so that
//! showing restores them exactly.
//!
//! Values are only written through [`Node::set_value`](super::node::Node::set_value),
//! which is where watchers hook in. The raw setter here is crate-private.

use serde::{Deserialize, Serialize};

/// Height of one widget row, in canvas units.
pub const WIDGET_ROW_HEIGHT: f32 = 20.0;
/// Vertical gap after every widget row.
pub const WIDGET_SPACING: f32 = 4.0;

/// Current value held by a widget.
///
/// Serialized untagged so parameter messages carry plain JSON scalars
/// (`1.2`, `true`, `"bilinear"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Choice(String),
}

impl WidgetValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WidgetValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WidgetValue::Float(v) => Some(*v),
            WidgetValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WidgetValue::Choice(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for WidgetValue {
    fn from(v: bool) -> Self {
        WidgetValue::Bool(v)
    }
}

impl From<i64> for WidgetValue {
    fn from(v: i64) -> Self {
        WidgetValue::Int(v)
    }
}

impl From<i32> for WidgetValue {
    fn from(v: i32) -> Self {
        WidgetValue::Int(v as i64)
    }
}

impl From<f64> for WidgetValue {
    fn from(v: f64) -> Self {
        WidgetValue::Float(v)
    }
}

impl From<&str> for WidgetValue {
    fn from(v: &str) -> Self {
        WidgetValue::Choice(v.to_string())
    }
}

/// How a widget renders and accepts input.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    /// Float slider
    Slider { min: f64, max: f64, step: f64 },
    /// Integer number box
    Number { min: i64, max: i64, step: i64 },
    /// Enum dropdown
    Combo { options: Vec<String> },
    /// Boolean switch with on/off labels
    Toggle { label_on: String, label_off: String },
    /// Push button, value unused
    Button,
    /// Placeholder kind while the widget is hidden
    Hidden,
}

/// Size-computation behaviour of a widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeRule {
    /// Full node width, one row high
    Row,
    /// Explicit footprint
    Fixed { width: f32, height: f32 },
    /// Zero footprint: the negative height cancels the row spacing
    Collapsed,
}

impl SizeRule {
    pub fn compute(&self, node_width: f32) -> [f32; 2] {
        match self {
            SizeRule::Row => [node_width, WIDGET_ROW_HEIGHT],
            SizeRule::Fixed { width, height } => [*width, *height],
            SizeRule::Collapsed => [0.0, -WIDGET_SPACING],
        }
    }
}

/// Rendering state captured the first time a widget is hidden.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetOrigin {
    pub kind: WidgetKind,
    pub size: SizeRule,
}

/// One control on a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    name: String,
    kind: WidgetKind,
    size: SizeRule,
    value: WidgetValue,
    visible: bool,
    interactive: bool,
    linked: Vec<String>,
    origin: Option<WidgetOrigin>,
}

impl Widget {
    pub fn new(name: impl Into<String>, kind: WidgetKind, value: WidgetValue) -> Self {
        Self {
            name: name.into(),
            kind,
            size: SizeRule::Row,
            value,
            visible: true,
            interactive: true,
            linked: Vec::new(),
            origin: None,
        }
    }

    pub fn slider(name: impl Into<String>, value: f64, min: f64, max: f64, step: f64) -> Self {
        Self::new(name, WidgetKind::Slider { min, max, step }, WidgetValue::Float(value))
    }

    pub fn number(name: impl Into<String>, value: i64, min: i64, max: i64, step: i64) -> Self {
        Self::new(name, WidgetKind::Number { min, max, step }, WidgetValue::Int(value))
    }

    pub fn combo(name: impl Into<String>, options: &[&str], value: &str) -> Self {
        let options = options.iter().map(|s| s.to_string()).collect();
        Self::new(name, WidgetKind::Combo { options }, WidgetValue::Choice(value.to_string()))
    }

    pub fn toggle(name: impl Into<String>, value: bool, label_on: &str, label_off: &str) -> Self {
        let kind = WidgetKind::Toggle {
            label_on: label_on.to_string(),
            label_off: label_off.to_string(),
        };
        Self::new(name, kind, WidgetValue::Bool(value))
    }

    pub fn button(name: impl Into<String>) -> Self {
        Self::new(name, WidgetKind::Button, WidgetValue::Bool(false))
    }

    /// Attach widgets that hide and show together with this one.
    pub fn with_linked(mut self, linked: &[&str]) -> Self {
        self.linked = linked.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_size(mut self, size: SizeRule) -> Self {
        self.size = size;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    pub fn size_rule(&self) -> SizeRule {
        self.size
    }

    pub fn value(&self) -> &WidgetValue {
        &self.value
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn linked(&self) -> &[String] {
        &self.linked
    }

    pub fn origin(&self) -> Option<&WidgetOrigin> {
        self.origin.as_ref()
    }

    /// Footprint of this widget for a node of the given width.
    pub fn computed_size(&self, node_width: f32) -> [f32; 2] {
        self.size.compute(node_width)
    }

    /// Kind the widget renders as when shown, even while hidden.
    pub fn effective_kind(&self) -> &WidgetKind {
        match (&self.kind, &self.origin) {
            (WidgetKind::Hidden, Some(origin)) => &origin.kind,
            (kind, _) => kind,
        }
    }

    /// Dropdown options, if this is a combo.
    pub fn options(&self) -> Option<&[String]> {
        match self.effective_kind() {
            WidgetKind::Combo { options } => Some(options),
            _ => None,
        }
    }

    /// Replace dropdown options. Applies to the saved origin when hidden.
    /// Returns false if the widget is not a combo.
    pub fn set_options(&mut self, new_options: Vec<String>) -> bool {
        let kind = match (&mut self.kind, &mut self.origin) {
            (WidgetKind::Hidden, Some(origin)) => &mut origin.kind,
            (kind, _) => kind,
        };
        match kind {
            WidgetKind::Combo { options } => {
                *options = new_options;
                true
            }
            _ => false,
        }
    }

    /// Convert an incoming value to this widget's value type.
    ///
    /// Host deserialization hands over integers for float sliders, floats for
    /// number boxes and 0/1 for toggles. Any other mismatch is `None`.
    pub fn coerce(&self, value: WidgetValue) -> Option<WidgetValue> {
        match (self.effective_kind(), value) {
            (WidgetKind::Slider { .. }, v @ WidgetValue::Float(_)) => Some(v),
            (WidgetKind::Slider { .. }, WidgetValue::Int(v)) => Some(WidgetValue::Float(v as f64)),
            (WidgetKind::Number { .. }, v @ WidgetValue::Int(_)) => Some(v),
            (WidgetKind::Number { .. }, WidgetValue::Float(v)) => Some(WidgetValue::Int(v.round() as i64)),
            (WidgetKind::Combo { .. }, v @ WidgetValue::Choice(_)) => Some(v),
            (WidgetKind::Toggle { .. } | WidgetKind::Button, v @ WidgetValue::Bool(_)) => Some(v),
            (WidgetKind::Toggle { .. }, WidgetValue::Int(0)) => Some(WidgetValue::Bool(false)),
            (WidgetKind::Toggle { .. }, WidgetValue::Int(1)) => Some(WidgetValue::Bool(true)),
            (WidgetKind::Hidden, v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn replace_value(&mut self, value: WidgetValue) -> WidgetValue {
        std::mem::replace(&mut self.value, value)
    }

    /// Save the shown kind and size once. Later calls keep the first capture.
    pub(crate) fn capture_origin(&mut self) {
        if self.origin.is_none() {
            self.origin = Some(WidgetOrigin {
                kind: self.kind.clone(),
                size: self.size,
            });
        }
    }

    pub(crate) fn collapse(&mut self) {
        self.kind = WidgetKind::Hidden;
        self.size = SizeRule::Collapsed;
        self.visible = false;
        self.interactive = false;
    }

    pub(crate) fn restore(&mut self) {
        if let Some(origin) = &self.origin {
            self.kind = origin.kind.clone();
            self.size = origin.size;
        }
        self.visible = true;
        self.interactive = true;
    }
}
