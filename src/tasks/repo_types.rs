use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::enrichment::{Enrichment, WeatherData};

/// Priority label on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tag {
    Low,
    Medium,
    High,
    #[serde(rename = "Not urgent")]
    NotUrgent,
    Urgent,
}

impl Tag {
    pub const ALL: [Tag; 5] = [Tag::Low, Tag::Medium, Tag::High, Tag::NotUrgent, Tag::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Low => "Low",
            Tag::Medium => "Medium",
            Tag::High => "High",
            Tag::NotUrgent => "Not urgent",
            Tag::Urgent => "Urgent",
        }
    }

    /// Exact, case-sensitive match on the wire label.
    pub fn parse(raw: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

/// Task as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub is_completed: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub tag: Option<Tag>,
    pub note: Option<String>,
    pub weather_city: Option<String>,
    pub weather_data: Option<WeatherData>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row shape of the `tasks` table.
#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub is_completed: bool,
    pub due_date: Option<OffsetDateTime>,
    pub tag: Option<String>,
    pub note: Option<String>,
    pub weather_city: Option<String>,
    pub weather_data: Option<Json<WeatherData>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            is_completed: r.is_completed,
            due_date: r.due_date,
            tag: r.tag.as_deref().and_then(Tag::parse),
            note: r.note,
            weather_city: r.weather_city,
            weather_data: r.weather_data.map(|Json(w)| w),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Insert payload for a task, enrichment already resolved.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub due_date: Option<OffsetDateTime>,
    pub tag: Option<Tag>,
    pub note: Option<String>,
    pub weather_city: Option<String>,
    pub weather_data: Option<WeatherData>,
}

/// Columns an update may write. `None` leaves a column alone; the inner
/// `None` of the clearable fields sets it to NULL. Completion is never
/// written here, only through `TaskStore::set_completed`.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub due_date: Option<Option<OffsetDateTime>>,
    pub tag: Option<Option<Tag>>,
    pub note: Option<Option<String>>,
    /// Replaces both weather columns when present.
    pub enrichment: Option<Enrichment>,
}

impl TaskUpdate {
    /// Weather column values for a recomputed enrichment; weather never
    /// outlives its city.
    pub fn weather_columns(&self) -> Option<(Option<String>, Option<WeatherData>)> {
        self.enrichment.as_ref().map(|e| {
            let weather = e.city.as_ref().and(e.weather.clone());
            (e.city.clone(), weather)
        })
    }
}

/// Optional list filters, all ANDed with the owner.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub search: Option<String>,
    pub is_completed: Option<bool>,
    pub tag: Option<Tag>,
}

impl TaskFilter {
    /// In-process equivalent of the SQL `WHERE` clause.
    #[cfg(test)]
    pub fn matches(&self, task: &Task) -> bool {
        if self.is_completed.is_some_and(|c| c != task.is_completed) {
            return false;
        }
        if self.tag.is_some() && self.tag != task.tag {
            return false;
        }
        match self.search.as_deref() {
            Some(needle) => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task
                        .note
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// `ILIKE` pattern with `%`, `_` and `\` escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|s| {
            let mut escaped = String::with_capacity(s.len() + 2);
            escaped.push('%');
            for c in s.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped.push('%');
            escaped
        })
    }
}
