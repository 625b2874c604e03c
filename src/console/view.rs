//! Views, tabs, and read-only panel state.

use std::fmt;
use std::str::FromStr;

use crate::form::field::Section;

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Panel,
}

/// Mutually exclusive pane of the client panel, keyed by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Company,
    Ai,
    Behavior,
    Theme,
    Layout,
    Links,
    Leads,
    Routing,
    Logic,
    Stats,
    Logs,
    Preview,
}

impl Tab {
    pub const ALL: &'static [Tab] = &[
        Tab::Company,
        Tab::Ai,
        Tab::Behavior,
        Tab::Theme,
        Tab::Layout,
        Tab::Links,
        Tab::Leads,
        Tab::Routing,
        Tab::Logic,
        Tab::Stats,
        Tab::Logs,
        Tab::Preview,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Ai => "ai",
            Self::Behavior => "behavior",
            Self::Theme => "theme",
            Self::Layout => "layout",
            Self::Links => "links",
            Self::Leads => "leads",
            Self::Routing => "routing",
            Self::Logic => "logic",
            Self::Stats => "stats",
            Self::Logs => "logs",
            Self::Preview => "preview",
        }
    }

    /// Field groups shown on this tab. Empty for the read-only panels.
    pub fn sections(self) -> &'static [Section] {
        match self {
            Self::Company => &[Section::Status, Section::Company],
            Self::Ai => &[Section::Ai, Section::Prompts],
            Self::Behavior => &[Section::Behavior],
            Self::Theme => &[Section::Theme, Section::DarkMode],
            Self::Layout => &[Section::Layout],
            Self::Links => &[Section::Links],
            Self::Leads => &[Section::Leads],
            Self::Routing => &[Section::Routing],
            Self::Logic => &[Section::Logic],
            Self::Stats | Self::Logs | Self::Preview => &[],
        }
    }

    pub fn is_form(self) -> bool {
        !self.sections().is_empty()
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Tab::ALL
            .iter()
            .copied()
            .find(|tab| tab.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Tab::ALL.iter().map(|t| t.name()).collect();
                format!("unknown tab '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// State of a read-only panel (stats, logs).
///
/// A failed fetch is kept as an inline message; it never propagates.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Panel<T> {
    #[default]
    Idle,
    Loaded(T),
    Failed(String),
}

impl<T> Panel<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_names_round_trip() {
        for tab in Tab::ALL {
            assert_eq!(tab.name().parse::<Tab>(), Ok(*tab));
        }
        assert_eq!(" Theme ".parse::<Tab>(), Ok(Tab::Theme));
        assert!("billing".parse::<Tab>().is_err());
    }

    #[test]
    fn every_section_is_on_exactly_one_tab() {
        for section in Section::ALL {
            let hits = Tab::ALL
                .iter()
                .filter(|tab| tab.sections().contains(section))
                .count();
            assert_eq!(hits, 1, "{section}");
        }
    }

    #[test]
    fn panels_are_not_forms() {
        assert!(Tab::Company.is_form());
        assert!(!Tab::Stats.is_form());
        assert!(!Tab::Preview.is_form());
    }
}
