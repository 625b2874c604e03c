//! Typed field descriptors for every editable part of a client record.
//!
//! Each descriptor binds a label and a short key to a dotted path inside the
//! record and says how raw input is parsed ([`FieldKind`]). The `default`
//! text is what a form shows when the record has no value; it is never
//! written into the record by itself.

use std::fmt;

/// Numeric flavor of a [`FieldKind::Number`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Float,
}

/// How a field's raw text is parsed and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed free text.
    Text,
    /// Parsed number; unparseable input stores `null`.
    Number(NumberKind),
    /// One of a fixed set of options.
    Select(&'static [&'static str]),
    /// Boolean toggle.
    Switch,
    /// Hex color, shown as swatch + text.
    Color,
    /// Raw JSON value, validated before it is stored.
    Json,
    /// Comma separated text stored as an array of strings.
    List,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number(NumberKind::Integer) => "integer",
            Self::Number(NumberKind::Float) => "number",
            Self::Select(_) => "select",
            Self::Switch => "switch",
            Self::Color => "color",
            Self::Json => "json",
            Self::List => "list",
        }
    }
}

/// One editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Short kebab-case key, accepted wherever a path is.
    pub key: &'static str,
    pub label: &'static str,
    /// Dotted path into the record.
    pub path: &'static str,
    pub kind: FieldKind,
    /// Display text used when the record has no value.
    pub default: &'static str,
}

const fn field(
    key: &'static str,
    label: &'static str,
    path: &'static str,
    kind: FieldKind,
    default: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        path,
        kind,
        default,
    }
}

const INT: FieldKind = FieldKind::Number(NumberKind::Integer);
const FLOAT: FieldKind = FieldKind::Number(NumberKind::Float);

pub const STATUS_OPTIONS: &[&str] = &["active", "inactive", "maintenance"];
pub const POSITION_OPTIONS: &[&str] = &["left", "right"];

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// A titled group of fields rendered together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Status,
    Company,
    Ai,
    Prompts,
    Behavior,
    Theme,
    DarkMode,
    Layout,
    Links,
    Leads,
    Routing,
    Logic,
}

impl Section {
    pub const ALL: &'static [Section] = &[
        Section::Status,
        Section::Company,
        Section::Ai,
        Section::Prompts,
        Section::Behavior,
        Section::Theme,
        Section::DarkMode,
        Section::Layout,
        Section::Links,
        Section::Leads,
        Section::Routing,
        Section::Logic,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Company => "Company",
            Self::Ai => "AI model",
            Self::Prompts => "Prompts",
            Self::Behavior => "Behavior",
            Self::Theme => "Theme",
            Self::DarkMode => "Dark mode",
            Self::Layout => "Layout",
            Self::Links => "Business links",
            Self::Leads => "Lead form",
            Self::Routing => "Routing",
            Self::Logic => "Keyword logic",
        }
    }

    pub fn fields(self) -> &'static [FieldDescriptor] {
        match self {
            Self::Status => STATUS_FIELDS,
            Self::Company => COMPANY_FIELDS,
            Self::Ai => AI_FIELDS,
            Self::Prompts => PROMPT_FIELDS,
            Self::Behavior => BEHAVIOR_FIELDS,
            Self::Theme => THEME_FIELDS,
            Self::DarkMode => DARK_MODE_FIELDS,
            Self::Layout => LAYOUT_FIELDS,
            Self::Links => LINK_FIELDS,
            Self::Leads => LEAD_FIELDS,
            Self::Routing => ROUTING_FIELDS,
            Self::Logic => LOGIC_FIELDS,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

const STATUS_FIELDS: &[FieldDescriptor] = &[
    field("status", "Status", "status", FieldKind::Select(STATUS_OPTIONS), "active"),
    field("status-message", "Status message", "statusMessage", FieldKind::Text, ""),
];

const COMPANY_FIELDS: &[FieldDescriptor] = &[
    field("company-name", "Name", "company.name", FieldKind::Text, ""),
    field("company-email", "Email", "company.email", FieldKind::Text, ""),
    field("company-phone", "Phone", "company.phone", FieldKind::Text, ""),
    field("company-address", "Address", "company.address", FieldKind::Text, ""),
    field("company-hours", "Opening hours", "company.hours", FieldKind::Text, ""),
];

const AI_FIELDS: &[FieldDescriptor] = &[
    field("model", "Model", "model", FieldKind::Text, ""),
    field("temperature", "Temperature", "temperature", FLOAT, "0.4"),
    field("max-tokens", "Max tokens", "maxTokens", INT, "300"),
    field("top-p", "Top P", "top_p", FLOAT, "1"),
    field("presence-penalty", "Presence penalty", "presence_penalty", FLOAT, "0"),
    field("frequency-penalty", "Frequency penalty", "frequency_penalty", FLOAT, "0"),
    field("context-limit", "Context limit", "context_limit", INT, "3000"),
];

const PROMPT_FIELDS: &[FieldDescriptor] = &[
    field("system-prompt", "System prompt", "system_prompt", FieldKind::Text, ""),
    field("knowledge", "Knowledge", "knowledge", FieldKind::Text, ""),
    field("rules", "Rules", "rules", FieldKind::Text, ""),
];

const BEHAVIOR_FIELDS: &[FieldDescriptor] = &[
    field("welcome-message", "Welcome message", "welcome_message", FieldKind::Text, ""),
    field("welcome-hint", "Welcome hint", "welcome_hint", FieldKind::Text, ""),
    field("launcher-icon", "Launcher icon", "launcher_icon", FieldKind::Text, ""),
    field("auto-open-enabled", "Auto open", "auto_open_enabled", FieldKind::Switch, "false"),
    field("auto-open-delay", "Auto open delay (ms)", "auto_open_delay", INT, "15000"),
    field("quick-replies", "Quick replies", "quick_replies", FieldKind::List, ""),
];

const THEME_FIELDS: &[FieldDescriptor] = &[
    field("theme-header-bg", "Header background", "theme.headerBg", FieldKind::Color, "#020617"),
    field("theme-header-text", "Header text", "theme.headerText", FieldKind::Color, "#e5e7eb"),
    field("theme-user-bubble-bg", "User bubble", "theme.userBubbleBg", FieldKind::Color, "#0f172a"),
    field("theme-user-bubble-text", "User bubble text", "theme.userBubbleText", FieldKind::Color, "#e5e7eb"),
    field("theme-bot-bubble-bg", "Bot bubble", "theme.botBubbleBg", FieldKind::Color, "#020617"),
    field("theme-bot-bubble-text", "Bot bubble text", "theme.botBubbleText", FieldKind::Color, "#94a3b8"),
    field("theme-widget-bg", "Widget background", "theme.widgetBg", FieldKind::Color, "#020617"),
    field("theme-input-bg", "Input background", "theme.inputBg", FieldKind::Color, "#020617"),
    field("theme-input-text", "Input text", "theme.inputText", FieldKind::Color, "#e5e7eb"),
    field("theme-button-bg", "Button", "theme.buttonBg", FieldKind::Color, "#7c3aed"),
    field("theme-button-text", "Button text", "theme.buttonText", FieldKind::Color, "#ffffff"),
    field("theme-radius", "Corner radius", "theme.radius", INT, "22"),
    field("theme-position", "Position", "theme.position", FieldKind::Select(POSITION_OPTIONS), "right"),
];

const DARK_MODE_FIELDS: &[FieldDescriptor] = &[
    field("dark-mode-enabled", "Dark mode", "dark_mode_enabled", FieldKind::Switch, "false"),
    field("dark-mode-theme", "Dark theme", "dark_mode_theme", FieldKind::Json, ""),
];

const LAYOUT_FIELDS: &[FieldDescriptor] = &[
    field("launcher-size", "Launcher size", "launcher_size", INT, "64"),
    field("header-height", "Header height", "header_height", INT, "52"),
    field("input-height", "Input height", "input_height", INT, "48"),
    field("bubble-radius", "Bubble radius", "bubble_radius", INT, "18"),
    field("offset-x", "Offset X", "offset_x", INT, "20"),
    field("offset-y", "Offset Y", "offset_y", INT, "20"),
];

const LINK_FIELDS: &[FieldDescriptor] = &[
    field("website", "Website", "website", FieldKind::Text, ""),
    field("facebook-url", "Facebook", "facebook_url", FieldKind::Text, ""),
    field("instagram-url", "Instagram", "instagram_url", FieldKind::Text, ""),
    field("google-maps-url", "Google Maps", "google_maps_url", FieldKind::Text, ""),
];

const LEAD_FIELDS: &[FieldDescriptor] = &[
    field("lead-form-enabled", "Lead form", "lead_form_enabled", FieldKind::Switch, "false"),
    field("lead-form-title", "Title", "lead_form_title", FieldKind::Text, ""),
    field("lead-form-success-message", "Success message", "lead_form_success_message", FieldKind::Text, ""),
    field("lead-form-fields", "Fields", "lead_form_fields", FieldKind::Json, ""),
];

const ROUTING_FIELDS: &[FieldDescriptor] = &[
    field("forward-to-email", "Forward to email", "forward_to_email", FieldKind::Text, ""),
    field("webhook-url", "Webhook URL", "webhook_url", FieldKind::Text, ""),
    field("zapier-url", "Zapier URL", "zapier_url", FieldKind::Text, ""),
    field("make-url", "Make URL", "make_url", FieldKind::Text, ""),
];

const LOGIC_FIELDS: &[FieldDescriptor] = &[
    field("blocked-keywords", "Blocked keywords", "blocked_keywords", FieldKind::List, ""),
    field("allowed-keywords", "Allowed keywords", "allowed_keywords", FieldKind::List, ""),
    field("fallback-message", "Fallback message", "fallback_message", FieldKind::Text, ""),
    field("handoff-message", "Handoff message", "handoff_message", FieldKind::Text, ""),
];

/// Every descriptor, in display order.
pub fn all_fields() -> impl Iterator<Item = &'static FieldDescriptor> {
    Section::ALL.iter().flat_map(|section| section.fields().iter())
}

/// Look a field up by its dotted path or its short key.
pub fn find_field(name: &str) -> Option<&'static FieldDescriptor> {
    all_fields().find(|f| f.path == name || f.key == name)
}
