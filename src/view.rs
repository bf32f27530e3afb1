// 🧭 Views - navigation tags, the current-view state and pure rendering into a screen tree
// Rendering is independent of any terminal/web technology; surfaces draw the `Screen`.

use crate::forms::FormSchema;
use crate::record::{Record, RecordType};
use crate::summary::SummaryView;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("unknown view {0:?} (expected home, expense, activity, habit, work or summary)")]
    UnknownTag(String),

    #[error("no form is mounted")]
    NoFormMounted,

    #[error("no delete is awaiting confirmation")]
    NoPendingDelete,
}

// ============================================================================
// NAVIGATION TAGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavTag {
    Home,
    Expense,
    Activity,
    Habit,
    Work,
    Summary,
}

impl NavTag {
    pub const ALL: [NavTag; 6] = [
        NavTag::Home,
        NavTag::Expense,
        NavTag::Activity,
        NavTag::Habit,
        NavTag::Work,
        NavTag::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NavTag::Home => "home",
            NavTag::Expense => "expense",
            NavTag::Activity => "activity",
            NavTag::Habit => "habit",
            NavTag::Work => "work",
            NavTag::Summary => "summary",
        }
    }

    /// Menu label
    pub fn title(&self) -> &'static str {
        match self {
            NavTag::Home => "Home",
            NavTag::Expense => "Expenses",
            NavTag::Activity => "Activity",
            NavTag::Habit => "Health",
            NavTag::Work => "Work & Study",
            NavTag::Summary => "Summary",
        }
    }

    pub fn next(&self) -> Self {
        let pos = NavTag::ALL.iter().position(|t| t == self).unwrap_or(0);
        NavTag::ALL[(pos + 1) % NavTag::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let pos = NavTag::ALL.iter().position(|t| t == self).unwrap_or(0);
        NavTag::ALL[(pos + NavTag::ALL.len() - 1) % NavTag::ALL.len()]
    }

    fn record_type(&self) -> Option<RecordType> {
        match self {
            NavTag::Expense => Some(RecordType::Expense),
            NavTag::Activity => Some(RecordType::Activity),
            NavTag::Habit => Some(RecordType::Habit),
            NavTag::Work => Some(RecordType::Work),
            NavTag::Home | NavTag::Summary => None,
        }
    }
}

impl fmt::Display for NavTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NavTag {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        NavTag::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| ViewError::UnknownTag(s.to_string()))
    }
}

// ============================================================================
// CURRENT VIEW + DISPATCH
// ============================================================================

/// Which view is mounted. Navigating always replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    Form(RecordType),
    Summary,
}

impl View {
    pub fn tag(&self) -> NavTag {
        match self {
            View::Home => NavTag::Home,
            View::Form(RecordType::Expense) => NavTag::Expense,
            View::Form(RecordType::Activity) => NavTag::Activity,
            View::Form(RecordType::Habit) => NavTag::Habit,
            View::Form(RecordType::Work) => NavTag::Work,
            View::Form(RecordType::Other(_)) => NavTag::Home,
            View::Summary => NavTag::Summary,
        }
    }
}

impl From<NavTag> for View {
    fn from(tag: NavTag) -> Self {
        match tag {
            NavTag::Home => View::Home,
            NavTag::Summary => View::Summary,
            form => form.record_type().map(View::Form).unwrap_or(View::Home),
        }
    }
}

/// What mounting a tag produces, before any store data is read
#[derive(Debug, Clone, PartialEq)]
pub enum ViewDescriptor {
    Home,
    Form(FormSchema),
    Summary,
}

/// Flat dispatch table: navigation tag -> view to mount
pub fn view_for(tag: NavTag) -> ViewDescriptor {
    match View::from(tag) {
        View::Home => ViewDescriptor::Home,
        View::Summary => ViewDescriptor::Summary,
        View::Form(record_type) => FormSchema::for_type(&record_type)
            .map(ViewDescriptor::Form)
            .unwrap_or(ViewDescriptor::Home),
    }
}

// ============================================================================
// SCREEN TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavLink {
    pub tag: NavTag,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeScreen {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub links: Vec<NavLink>,
}

impl HomeScreen {
    pub fn new() -> Self {
        Self {
            title: "Personal Tracker",
            subtitle: "Track expenses, activity, health habits and work/study time.",
            links: NavTag::ALL
                .into_iter()
                .filter(|t| *t != NavTag::Home)
                .map(|tag| NavLink {
                    tag,
                    label: tag.title(),
                })
                .collect(),
        }
    }
}

impl Default for HomeScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// Fully rendered content of one view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum Screen {
    Home(HomeScreen),
    Form(FormSchema),
    Summary(SummaryView),
}

/// Pure: the same descriptor and records always render the same screen
pub fn render(descriptor: &ViewDescriptor, records: &[Record]) -> Screen {
    match descriptor {
        ViewDescriptor::Home => Screen::Home(HomeScreen::new()),
        ViewDescriptor::Form(schema) => Screen::Form(schema.clone()),
        ViewDescriptor::Summary => Screen::Summary(SummaryView::build(records)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_parses_and_dispatches() {
        for tag in NavTag::ALL {
            assert_eq!(tag.as_str().parse::<NavTag>(), Ok(tag));
            assert_eq!(View::from(tag).tag(), tag);
        }

        assert_eq!(view_for(NavTag::Home), ViewDescriptor::Home);
        assert_eq!(view_for(NavTag::Summary), ViewDescriptor::Summary);
        match view_for(NavTag::Habit) {
            ViewDescriptor::Form(schema) => assert_eq!(schema.title, "Health Tracking"),
            other => panic!("expected habit form, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(
            "settings".parse::<NavTag>(),
            Err(ViewError::UnknownTag("settings".to_string()))
        );
    }

    #[test]
    fn test_tag_cycle() {
        assert_eq!(NavTag::Home.next(), NavTag::Expense);
        assert_eq!(NavTag::Summary.next(), NavTag::Home);
        assert_eq!(NavTag::Home.previous(), NavTag::Summary);
    }

    #[test]
    fn test_render_home_links_skip_home() {
        match render(&ViewDescriptor::Home, &[]) {
            Screen::Home(home) => {
                assert_eq!(home.links.len(), 5);
                assert!(home.links.iter().all(|l| l.tag != NavTag::Home));
            }
            other => panic!("expected home screen, got {other:?}"),
        }
    }

    #[test]
    fn test_render_summary_reads_records() {
        let records = vec![Record::new(RecordType::Work, "2024-01-01")
            .with_field("task", "Docs")
            .with_field("hours", 2)];

        match render(&ViewDescriptor::Summary, &records) {
            Screen::Summary(summary) => {
                assert_eq!(summary.stats.work, 1);
                assert_eq!(summary.history[0].primary_info, "Docs • 2 hrs");
            }
            other => panic!("expected summary screen, got {other:?}"),
        }
    }

    #[test]
    fn test_screen_serializes_with_view_tag() {
        let value = serde_json::to_value(render(&view_for(NavTag::Expense), &[])).unwrap();
        assert_eq!(value["view"], "form");
        assert_eq!(value["record_type"], "expense");
        assert_eq!(value["fields"][0]["input_type"], "number");
    }
}
