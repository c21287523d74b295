//! Static catalog of node types the control layer knows how to drive.
//!
//! Each [`NodeSpec`] lists a type's widgets with their defaults, which of
//! them are forwarded to the backend, whether the node runs an interactive
//! preview loop (Apply/Skip), and its mutually-exclusive widget groups.
//! Used by the setup registry and by [`build_node`] to create nodes the way
//! the host would.

use super::node::{Node, NodeId};
use super::widget::Widget;

// ============================================================================
// Definitions
// ============================================================================

/// Widget kind with constant-constructible parameters.
#[derive(Debug, Clone, Copy)]
pub enum DefKind {
    Float { min: f64, max: f64, step: f64 },
    Int { min: i64, max: i64, step: i64 },
    Toggle { on: &'static str, off: &'static str },
    Combo(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub enum DefValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Choice(&'static str),
}

/// One widget in a node type.
#[derive(Debug, Clone, Copy)]
pub struct WidgetDef {
    pub name: &'static str,
    pub kind: DefKind,
    pub default: DefValue,
}

impl WidgetDef {
    pub const fn float(name: &'static str, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self { name, kind: DefKind::Float { min, max, step }, default: DefValue::Float(default) }
    }

    pub const fn int(name: &'static str, default: i64, min: i64, max: i64, step: i64) -> Self {
        Self { name, kind: DefKind::Int { min, max, step }, default: DefValue::Int(default) }
    }

    pub const fn toggle(name: &'static str, default: bool, on: &'static str, off: &'static str) -> Self {
        Self { name, kind: DefKind::Toggle { on, off }, default: DefValue::Bool(default) }
    }

    /// Combo defaulting to its first option.
    pub const fn combo(name: &'static str, options: &'static [&'static str]) -> Self {
        Self { name, kind: DefKind::Combo(options), default: DefValue::Choice(options[0]) }
    }

    pub const fn combo_with(name: &'static str, options: &'static [&'static str], default: &'static str) -> Self {
        Self { name, kind: DefKind::Combo(options), default: DefValue::Choice(default) }
    }

    /// Build the live widget with default value.
    pub fn build(&self) -> Widget {
        match (self.kind, self.default) {
            (DefKind::Float { min, max, step }, DefValue::Float(v)) => Widget::slider(self.name, v, min, max, step),
            (DefKind::Int { min, max, step }, DefValue::Int(v)) => Widget::number(self.name, v, min, max, step),
            (DefKind::Toggle { on, off }, DefValue::Bool(v)) => Widget::toggle(self.name, v, on, off),
            (DefKind::Combo(options), DefValue::Choice(v)) => Widget::combo(self.name, options, v),
            // Mismatched pairs are a catalog typo; fall back to the kind's zero value.
            (DefKind::Float { min, max, step }, _) => Widget::slider(self.name, min, min, max, step),
            (DefKind::Int { min, max, step }, _) => Widget::number(self.name, min, min, max, step),
            (DefKind::Toggle { on, off }, _) => Widget::toggle(self.name, false, on, off),
            (DefKind::Combo(options), _) => {
                Widget::combo(self.name, options, options.first().copied().unwrap_or_default())
            }
        }
    }
}

/// Mutually-exclusive widget groups driven by a boolean toggle.
#[derive(Debug, Clone, Copy)]
pub struct ExclusiveDef {
    pub toggle: &'static str,
    /// Shown while the toggle is on, hidden while off
    pub when_on: &'static [&'static str],
    /// Shown while the toggle is off, hidden while on
    pub when_off: &'static [&'static str],
}

/// What the setup routine attaches beyond parameter sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Interactive effect: param sync + Apply/Skip
    Effect,
    /// Shows backend images only
    Preview,
    /// Dual-image compare renderer
    Compare,
    /// Empty latent with ratio/resolution derived options
    Latent,
}

/// Static description of one node type.
#[derive(Debug, Clone, Copy)]
pub struct NodeSpec {
    /// Host type tag ("Saturation")
    pub type_tag: &'static str,
    /// Wire key sent as `node_type` ("sat")
    pub key: &'static str,
    pub widgets: &'static [WidgetDef],
    /// Widgets whose values make up the parameter message
    pub watched: &'static [&'static str],
    pub exclusive: &'static [ExclusiveDef],
    pub behavior: Behavior,
}

impl NodeSpec {
    /// Runs a backend preview loop and needs Apply/Skip.
    pub fn is_interactive(&self) -> bool {
        self.behavior == Behavior::Effect
    }

    /// Receives preview images from the backend.
    pub fn is_preview_capable(&self) -> bool {
        matches!(self.behavior, Behavior::Effect | Behavior::Preview | Behavior::Compare)
    }
}

// ============================================================================
// Shared option lists
// ============================================================================

const INTERPOLATION: &[&str] = &["area", "nearest", "bilinear", "bicubic", "lanczos"];
const APPLY_TYPE: &[&str] = &["none", "auto_apply", "apply_all"];
const RESIZE_FIT: &[&str] = &["crop", "adjust", "fit"];

const RESIZE_GROUP: &[ExclusiveDef] = &[ExclusiveDef {
    toggle: "resize_by",
    when_on: &["multiplier"],
    when_off: &["width", "height"],
}];

// ============================================================================
// Color / exposure
// ============================================================================

const SATURATION_DEFS: &[WidgetDef] = &[WidgetDef::float("saturation", 0.0, -100.0, 100.0, 1.0)];

const HIGHLIGHT_SHADOW_DEFS: &[WidgetDef] = &[
    WidgetDef::float("shadow_adjustment", 0.0, -100.0, 100.0, 1.0),
    WidgetDef::float("highlight_adjustment", 0.0, -100.0, 100.0, 1.0),
    WidgetDef::float("midpoint", 0.5, 0.0, 1.0, 0.01),
    WidgetDef::float("feather_radius", 50.0, 0.0, 200.0, 1.0),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

const DITHER_DEFS: &[WidgetDef] = &[
    WidgetDef::combo("dither_method", &["none", "bayer", "arithmetic_add", "blue_noise"]),
    WidgetDef::int("r_levels", 8, 2, 256, 1),
    WidgetDef::int("g_levels", 8, 2, 256, 1),
    WidgetDef::int("b_levels", 8, 2, 256, 1),
    WidgetDef::float("dither_scale", 1.0, 0.25, 5.0, 0.25),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

// ============================================================================
// Depth
// ============================================================================

const DEPTH_DOF_DEFS: &[WidgetDef] = &[
    WidgetDef::float("focus_depth", 0.5, 0.0, 1.0, 0.01),
    WidgetDef::float("blur_strength", 10.0, 0.0, 100.0, 1.0),
    WidgetDef::float("hard_focus_range", 0.0, 0.0, 0.5, 0.01),
    WidgetDef::float("focus_range", 0.25, 0.0, 1.0, 0.01),
    WidgetDef::int("edge_fix", 0, 0, 5, 1),
    WidgetDef::toggle("auto_apply", false, "On", "Off"),
];

const CAMERA_DOF_DEFS: &[WidgetDef] = &[
    WidgetDef::float("focal_point", 0.5, 0.0, 1.0, 0.01),
    WidgetDef::float("blur_strength", 10.0, 0.0, 100.0, 1.0),
    WidgetDef::float("focal_plane", 0.0, 0.0, 0.5, 0.01),
    WidgetDef::float("focus_falloff", 0.25, 0.0, 1.0, 0.01),
    WidgetDef::int("edge_fix", 0, 0, 5, 1),
    WidgetDef::int("in_focus_mask_fix", 0, 0, 10, 1),
    WidgetDef::combo("bokeh_shape", &["circle", "hexagon", "octagon"]),
    WidgetDef::float("highlight_factor", 0.0, 0.0, 1.0, 0.05),
    WidgetDef::float("highlight_threshold_low", 0.0, 0.0, 1.0, 0.05),
    WidgetDef::float("highlight_threshold_high", 1.0, 0.0, 1.0, 0.05),
    WidgetDef::toggle("depth_aware_blur", false, "true", "false"),
    WidgetDef::toggle("blur_fixed_edge", false, "true", "false"),
];

// ============================================================================
// Transform
// ============================================================================

const IMAGE_RESIZE_DEFS: &[WidgetDef] = &[
    WidgetDef::toggle("resize_by", false, "Multiplier", "Absolute"),
    WidgetDef::int("width", 512, 64, 8192, 8),
    WidgetDef::int("height", 512, 64, 8192, 8),
    WidgetDef::float("multiplier", 1.0, 0.1, 8.0, 0.1),
    WidgetDef::combo_with("interpolation", INTERPOLATION, "bilinear"),
    WidgetDef::combo("fit_mode", RESIZE_FIT),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

const IMAGE_ROTATION_DEFS: &[WidgetDef] = &[
    WidgetDef::float("rotate", 0.0, -360.0, 360.0, 1.0),
    WidgetDef::combo_with("interpolation", INTERPOLATION, "bilinear"),
    WidgetDef::combo("fit_mode", &["crop", "fit", "adjust", "none"]),
    WidgetDef::combo("bg_color", &["black", "white"]),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

const IMAGE_ZOOM_DEFS: &[WidgetDef] = &[
    WidgetDef::float("zoom", 1.0, 0.1, 5.0, 0.01),
    WidgetDef::combo_with("interpolation", INTERPOLATION, "bilinear"),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

const TRANSLATION_DEFS: &[WidgetDef] = &[
    WidgetDef::int("translate_x", 0, -4096, 4096, 1),
    WidgetDef::int("translate_y", 0, -4096, 4096, 1),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

// ============================================================================
// Mask
// ============================================================================

const MASK_RESIZE_DEFS: &[WidgetDef] = &[
    WidgetDef::toggle("resize_by", false, "Multiplier", "Absolute"),
    WidgetDef::int("width", 512, 64, 8192, 8),
    WidgetDef::int("height", 512, 64, 8192, 8),
    WidgetDef::float("multiplier", 1.0, 0.1, 8.0, 0.1),
    WidgetDef::combo_with("interpolation", INTERPOLATION, "nearest"),
    WidgetDef::combo("fit_mode", RESIZE_FIT),
    WidgetDef::toggle("enhanced_visibility", false, "true", "false"),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

const MASK_ROTATION_DEFS: &[WidgetDef] = &[
    WidgetDef::float("rotate", 0.0, -360.0, 360.0, 0.1),
    WidgetDef::combo_with("interpolation", INTERPOLATION, "nearest"),
    WidgetDef::combo("fit_mode", RESIZE_FIT),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

const MASK_ZOOM_DEFS: &[WidgetDef] = &[
    WidgetDef::float("zoom", 1.0, 0.1, 5.0, 0.01),
    WidgetDef::combo_with("interpolation", INTERPOLATION, "nearest"),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

const MASK_FILTER_DEFS: &[WidgetDef] = &[
    WidgetDef::int("area_x", 3000, 0, 10_000_000, 100),
    WidgetDef::int("area_y", 5000, 0, 10_000_000, 100),
    WidgetDef::combo("keep", &["above_x", "bellow_x", "between_x_y"]),
    WidgetDef::combo("apply_type", APPLY_TYPE),
];

// ============================================================================
// Preview / compare / latent
// ============================================================================

const COMPARE_DEFS: &[WidgetDef] = &[WidgetDef::combo("compare_mode", &["slide", "click"])];

const LATENT_DEFS: &[WidgetDef] = &[
    WidgetDef::toggle("use_ratio", false, "Manual Mode", "Ratio Mode"),
    WidgetDef::toggle("portrait_landscape", false, "Potrait", "Landscape"),
    WidgetDef::int("width", 1024, 64, 8192, 64),
    WidgetDef::int("height", 1024, 64, 8192, 64),
    WidgetDef::combo("ratio", &["1:1", "3:2", "4:3", "5:3", "16:9", "16:10", "21:9", "32:9"]),
    WidgetDef::combo("resolution", &["1024x1024"]),
    WidgetDef::int("batch_size", 1, 1, 256, 1),
];

const LATENT_GROUP: &[ExclusiveDef] = &[ExclusiveDef {
    toggle: "use_ratio",
    when_on: &["width", "height"],
    when_off: &["ratio", "resolution"],
}];

const fn effect(
    type_tag: &'static str,
    key: &'static str,
    widgets: &'static [WidgetDef],
    watched: &'static [&'static str],
) -> NodeSpec {
    NodeSpec { type_tag, key, widgets, watched, exclusive: &[], behavior: Behavior::Effect }
}

pub static CATALOG: &[NodeSpec] = &[
    effect("Saturation", "sat", SATURATION_DEFS, &["saturation"]),
    effect(
        "DepthDOFNode",
        "dof",
        DEPTH_DOF_DEFS,
        &["focus_depth", "focus_range", "edge_fix", "hard_focus_range"],
    ),
    effect(
        "CameraDepthDOF",
        "cam_dof",
        CAMERA_DOF_DEFS,
        &["focal_point", "focal_plane", "focus_falloff", "edge_fix", "blur_strength"],
    ),
    effect(
        "HighlightShadow",
        "hs",
        HIGHLIGHT_SHADOW_DEFS,
        &["shadow_adjustment", "highlight_adjustment", "midpoint", "feather_radius"],
    ),
    effect(
        "Dither",
        "dither",
        DITHER_DEFS,
        &["dither_method", "r_levels", "g_levels", "b_levels", "dither_scale"],
    ),
    NodeSpec {
        exclusive: RESIZE_GROUP,
        ..effect(
            "ImageResize",
            "img_resize",
            IMAGE_RESIZE_DEFS,
            &["resize_by", "width", "height", "multiplier", "interpolation", "fit_mode"],
        )
    },
    effect(
        "ImageRotation",
        "img_rot",
        IMAGE_ROTATION_DEFS,
        &["rotate", "interpolation", "fit_mode", "bg_color"],
    ),
    effect("ImageZoom", "img_zoom", IMAGE_ZOOM_DEFS, &["zoom", "interpolation"]),
    effect("ImageTranslation", "img_trans", TRANSLATION_DEFS, &["translate_x", "translate_y"]),
    NodeSpec {
        exclusive: RESIZE_GROUP,
        ..effect(
            "MaskResize",
            "mask_resize",
            MASK_RESIZE_DEFS,
            &[
                "resize_by",
                "width",
                "height",
                "multiplier",
                "interpolation",
                "fit_mode",
                "enhanced_visibility",
            ],
        )
    },
    effect("MaskRotation", "mask_rot", MASK_ROTATION_DEFS, &["rotate", "interpolation", "fit_mode"]),
    effect("MaskZoom", "mask_zoom", MASK_ZOOM_DEFS, &["zoom", "interpolation"]),
    effect("MaskTranslation", "mask_trans", TRANSLATION_DEFS, &["translate_x", "translate_y"]),
    effect("MaskFilter", "mask_filter", MASK_FILTER_DEFS, &["area_x", "area_y", "keep"]),
    NodeSpec {
        type_tag: "RAMPreviewImage",
        key: "ram_preview",
        widgets: &[],
        watched: &[],
        exclusive: &[],
        behavior: Behavior::Preview,
    },
    NodeSpec {
        type_tag: "RAMImageCompare",
        key: "ram_compare",
        widgets: COMPARE_DEFS,
        watched: &[],
        exclusive: &[],
        behavior: Behavior::Compare,
    },
    NodeSpec {
        type_tag: "AdvancedEmptyLatent",
        key: "latent",
        widgets: LATENT_DEFS,
        watched: &[],
        exclusive: LATENT_GROUP,
        behavior: Behavior::Latent,
    },
];

/// Find a node type by host type tag.
pub fn lookup(type_tag: &str) -> Option<&'static NodeSpec> {
    CATALOG.iter().find(|s| s.type_tag == type_tag)
}

/// Create a node with the type's default widgets, as the host would.
pub fn build_node(spec: &NodeSpec, id: NodeId) -> Node {
    let mut node = Node::new(id, spec.type_tag);
    for def in spec.widgets {
        node.add_widget(def.build());
    }
    node.fit_to_widgets();
    node
}
