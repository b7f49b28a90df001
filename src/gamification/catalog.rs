//! Achievement definitions and the catalog that holds them
//!
//! The catalog is authored once (seeded defaults or `[[achievement]]` tables in the
//! config file) and stays immutable for the lifetime of an engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::CatalogError;

/// Grouping used for filtering on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AchievementCategory {
    TaskMaster,
    Attendance,
    Social,
    Learning,
    Communication,
    Streak,
    Time,
    General,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskMaster => "task-master",
            Self::Attendance => "attendance",
            Self::Social => "social",
            Self::Learning => "learning",
            Self::Communication => "communication",
            Self::Streak => "streak",
            Self::Time => "time",
            Self::General => "general",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::TaskMaster => "Tasks",
            Self::Attendance => "Attendance",
            Self::Social => "Social",
            Self::Learning => "Learning",
            Self::Communication => "Communication",
            Self::Streak => "Streaks",
            Self::Time => "Time",
            Self::General => "General",
        }
    }

    pub fn all() -> &'static [AchievementCategory] {
        &[
            Self::TaskMaster,
            Self::Attendance,
            Self::Social,
            Self::Learning,
            Self::Communication,
            Self::Streak,
            Self::Time,
            Self::General,
        ]
    }

    /// Infer the category from an id such as `task-master-1` or `streak-7`.
    ///
    /// Only called while authoring a catalog entry; the result is stored on the entry.
    pub fn infer_from_id(id: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .filter(|c| *c != Self::General)
            .find(|c| {
                id.strip_prefix(c.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
            })
            .unwrap_or(Self::General)
    }
}

impl std::str::FromStr for AchievementCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task-master" => Ok(Self::TaskMaster),
            "attendance" => Ok(Self::Attendance),
            "social" => Ok(Self::Social),
            "learning" => Ok(Self::Learning),
            "communication" => Ok(Self::Communication),
            "streak" => Ok(Self::Streak),
            "time" => Ok(Self::Time),
            "general" => Ok(Self::General),
            other => Err(CatalogError::UnknownCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Points granted once, when the achievement is earned
    pub points: u32,
    /// Progress ceiling; reaching it earns the achievement
    pub max_progress: f64,
    pub category: AchievementCategory,
}

impl Achievement {
    /// Author an entry, inferring the category from the id
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        points: u32,
        max_progress: f64,
    ) -> Self {
        let id = id.into();
        let category = AchievementCategory::infer_from_id(&id);
        Self {
            id,
            title: title.into(),
            description: description.into(),
            points,
            max_progress,
            category,
        }
    }

    pub fn with_category(mut self, category: AchievementCategory) -> Self {
        self.category = category;
        self
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::EmptyId);
        }
        if self.points == 0 {
            return Err(CatalogError::ZeroPoints(self.id.clone()));
        }
        if !self.max_progress.is_finite() || self.max_progress <= 0.0 {
            return Err(CatalogError::InvalidMaxProgress {
                id: self.id.clone(),
                max_progress: self.max_progress,
            });
        }
        Ok(())
    }
}

/// Validated, read-only set of achievements in authoring order
#[derive(Debug, Clone, Default)]
pub struct AchievementCatalog {
    entries: Vec<Achievement>,
    index: HashMap<String, usize>,
}

impl AchievementCatalog {
    /// Build a catalog, rejecting duplicate ids and invalid entries
    pub fn new(entries: Vec<Achievement>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            entry.validate()?;
            if index.insert(entry.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// The catalog shipped with the dashboard
    pub fn seeded() -> Self {
        let entries = SEED_ACHIEVEMENTS
            .iter()
            .map(|(id, title, description, points, max)| {
                Achievement::new(*id, *title, *description, *points, *max)
            })
            .collect();
        Self::new(entries).expect("seed catalog is valid")
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.entries.iter()
    }

    pub fn in_category(&self, category: AchievementCategory) -> impl Iterator<Item = &Achievement> {
        self.entries.iter().filter(move |a| a.category == category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every entry's points
    pub fn total_points(&self) -> u64 {
        self.entries.iter().map(|a| u64::from(a.points)).sum()
    }
}

/// (id, title, description, points, max progress)
const SEED_ACHIEVEMENTS: &[(&str, &str, &str, u32, f64)] = &[
    ("task-master-1", "Task Master", "Complete 10 tasks", 100, 10.0),
    ("attendance-1", "Perfect Attendance", "Attend 5 consecutive classes", 50, 5.0),
    ("social-1", "Social Butterfly", "Join 3 study groups", 75, 3.0),
    ("learning-1", "Knowledge Seeker", "Access learning resources 15 times", 150, 15.0),
    ("communication-1", "Active Communicator", "Send 20 messages in group chats", 80, 20.0),
    ("streak-1", "On a Roll", "Login for 7 consecutive days", 70, 7.0),
    ("time-1", "Time Manager", "Create 5 scheduled events", 60, 5.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_category_from_id() {
        assert_eq!(
            AchievementCategory::infer_from_id("task-master-1"),
            AchievementCategory::TaskMaster
        );
        assert_eq!(AchievementCategory::infer_from_id("streak-7"), AchievementCategory::Streak);
        assert_eq!(AchievementCategory::infer_from_id("time"), AchievementCategory::Time);
        // prefix must end on a segment boundary
        assert_eq!(AchievementCategory::infer_from_id("timely-1"), AchievementCategory::General);
        assert_eq!(AchievementCategory::infer_from_id("task-1"), AchievementCategory::General);
    }

    #[test]
    fn test_category_parses_kebab_names() {
        for category in AchievementCategory::all() {
            assert_eq!(category.as_str().parse::<AchievementCategory>(), Ok(*category));
        }
        assert_eq!(
            "tasks".parse::<AchievementCategory>(),
            Err(CatalogError::UnknownCategory("tasks".into()))
        );
    }

    #[test]
    fn test_seeded_catalog() {
        let catalog = AchievementCatalog::seeded();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.total_points(), 585);

        let task = catalog.get("task-master-1").unwrap();
        assert_eq!(task.points, 100);
        assert_eq!(task.max_progress, 10.0);
        assert_eq!(task.category, AchievementCategory::TaskMaster);

        assert_eq!(catalog.in_category(AchievementCategory::Social).count(), 1);
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_catalog_rejects_invalid_entries() {
        let dup = AchievementCatalog::new(vec![
            Achievement::new("a-1", "A", "", 10, 1.0),
            Achievement::new("a-1", "A again", "", 10, 1.0),
        ]);
        assert!(matches!(dup, Err(CatalogError::DuplicateId(id)) if id == "a-1"));

        let zero = AchievementCatalog::new(vec![Achievement::new("a-1", "A", "", 0, 1.0)]);
        assert!(matches!(zero, Err(CatalogError::ZeroPoints(_))));

        let nan = AchievementCatalog::new(vec![Achievement::new("a-1", "A", "", 5, f64::NAN)]);
        assert!(matches!(nan, Err(CatalogError::InvalidMaxProgress { .. })));

        let empty = AchievementCatalog::new(vec![Achievement::new("  ", "A", "", 5, 1.0)]);
        assert!(matches!(empty, Err(CatalogError::EmptyId)));
    }

    #[test]
    fn test_explicit_category_overrides_inference() {
        let a = Achievement::new("bonus-1", "Bonus", "", 5, 1.0)
            .with_category(AchievementCategory::Learning);
        assert_eq!(a.category, AchievementCategory::Learning);
    }
}
