use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// WorkCategory
// ---------------------------------------------------------------------------

/// The implementation concern a requirement belongs to.
///
/// Declaration order is build order: within a section every schema unit
/// precedes every service unit, and so on. `General` is only ever assigned
/// as the fallback for requirements no vocabulary recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkCategory {
    Schema,
    Service,
    Presentation,
    Integration,
    General,
}

impl WorkCategory {
    pub fn all() -> &'static [WorkCategory] {
        &[
            WorkCategory::Schema,
            WorkCategory::Service,
            WorkCategory::Presentation,
            WorkCategory::Integration,
            WorkCategory::General,
        ]
    }

    /// Categories that can be detected from content.
    pub fn detectable() -> &'static [WorkCategory] {
        &WorkCategory::all()[..4]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkCategory::Schema => "schema",
            WorkCategory::Service => "service",
            WorkCategory::Presentation => "presentation",
            WorkCategory::Integration => "integration",
            WorkCategory::General => "general",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkCategory::Schema => "Schema",
            WorkCategory::Service => "Service",
            WorkCategory::Presentation => "Presentation",
            WorkCategory::Integration => "Integration",
            WorkCategory::General => "General Implementation",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WorkCategory::Schema => "Schema Layer - Tables, Migrations, Indexes, Access Policies",
            WorkCategory::Service => "Service Layer - Routes, Handlers, Data Access",
            WorkCategory::Presentation => "Presentation Layer - Components, Pages, Rendering",
            WorkCategory::Integration => {
                "Integration Layer - Hooks, State Management, Wiring, Tests"
            }
            WorkCategory::General => "General Implementation - Work Not Tied to a Single Layer",
        }
    }

    /// Base effort per requirement, in hours.
    pub fn base_hours(self) -> u32 {
        match self {
            WorkCategory::Schema => 1,
            WorkCategory::Service => 2,
            WorkCategory::Presentation => 3,
            WorkCategory::Integration => 2,
            WorkCategory::General => 3,
        }
    }

    pub fn estimate(self, requirement_count: usize) -> String {
        let hours = self.base_hours() * requirement_count as u32;
        format!("{}-{} hours", hours, hours + 2)
    }
}

impl fmt::Display for WorkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkCategory {
    type Err = crate::error::SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schema" | "database" => Ok(WorkCategory::Schema),
            "service" | "api" => Ok(WorkCategory::Service),
            "presentation" | "ui" => Ok(WorkCategory::Presentation),
            "integration" => Ok(WorkCategory::Integration),
            "general" => Ok(WorkCategory::General),
            _ => Err(crate::error::SegmentError::InvalidCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// UnitId
// ---------------------------------------------------------------------------

/// Identity of a prompt unit: its section number and its position in that
/// section's canonical category pass. Orders by global execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId {
    pub section: u32,
    pub sequence: u32,
}

impl UnitId {
    pub fn new(section: u32, sequence: u32) -> Self {
        Self { section, sequence }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:02}-P{:02}", self.section, self.sequence)
    }
}

// ---------------------------------------------------------------------------
// Span
// ---------------------------------------------------------------------------

/// Half-open byte range into the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
