//! Core type definitions for the UI

use std::time::Instant;

/// Which part of the UI has keyboard focus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Search,
    MainContent,
}

impl ActiveSection {
    pub fn toggle(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::MainContent,
            ActiveSection::MainContent => ActiveSection::Search,
        }
    }
}

/// Listing shown in the main content area
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ContentTab {
    #[default]
    Queue,
    Search,
    Liked,
    Recent,
}

impl ContentTab {
    pub const ALL: [ContentTab; 4] = [
        ContentTab::Queue,
        ContentTab::Search,
        ContentTab::Liked,
        ContentTab::Recent,
    ];

    pub fn next(self) -> Self {
        match self {
            Self::Queue => Self::Search,
            Self::Search => Self::Liked,
            Self::Liked => Self::Recent,
            Self::Recent => Self::Queue,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Queue => Self::Recent,
            Self::Search => Self::Queue,
            Self::Liked => Self::Search,
            Self::Recent => Self::Liked,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Queue => "Queue",
            Self::Search => "Search",
            Self::Liked => "Liked Songs",
            Self::Recent => "Recently Played",
        }
    }
}

/// UI state for the application
#[derive(Clone)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub search_query: String,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::MainContent,
            search_query: String::new(),
            error_message: None,
            error_timestamp: None,
            show_help_popup: false,
        }
    }
}
