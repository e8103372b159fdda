use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    error::AppError,
    tasks::repo_types::{Tag, TaskFilter},
    validation::{double_option, FieldCheck},
};

pub const TITLE_MAX: usize = 200;
const TITLE_REQUIRED: &str = "Title is required";
const TITLE_TOO_LONG: &str = "Title must be less than 200 characters";
const BAD_DATE: &str = "Invalid datetime, expected RFC 3339";
const BAD_TAG: &str = "Invalid enum value. Expected 'Low' | 'Medium' | 'High' | 'Not urgent' | 'Urgent'";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub due_date: Option<String>,
    pub tag: Option<String>,
    pub note: Option<String>,
}

/// Absent keys leave a column alone; explicit `null` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tag: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub search: Option<String>,
    pub is_completed: Option<String>,
    pub tag: Option<String>,
}

/// Validated create payload.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub title: String,
    pub due_date: Option<OffsetDateTime>,
    pub tag: Option<Tag>,
    pub note: Option<String>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due_date: Option<Option<OffsetDateTime>>,
    pub tag: Option<Option<Tag>>,
    pub note: Option<Option<String>>,
}

impl TaskPatch {
    /// Title or note changes invalidate the stored weather.
    pub fn touches_text(&self) -> bool {
        self.title.is_some() || self.note.is_some()
    }
}

fn check_title(check: &mut FieldCheck, title: &str) {
    check.length(title, "title", 1, TITLE_MAX, TITLE_REQUIRED, TITLE_TOO_LONG);
}

fn parse_due_date(check: &mut FieldCheck, raw: Option<&str>) -> Option<OffsetDateTime> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(d) => Some(d),
        Err(_) => {
            check.fail("dueDate", BAD_DATE);
            None
        }
    }
}

fn parse_tag(check: &mut FieldCheck, raw: Option<&str>) -> Option<Tag> {
    let raw = raw?;
    let tag = Tag::parse(raw);
    if tag.is_none() {
        check.fail("tag", BAD_TAG);
    }
    tag
}

/// Empty notes are stored as NULL.
fn clean_note(raw: Option<String>) -> Option<String> {
    raw.filter(|n| !n.trim().is_empty())
}

impl CreateTaskRequest {
    pub fn validate(self) -> Result<TaskInput, AppError> {
        let mut check = FieldCheck::new();
        let title = self.title.map(|t| t.trim().to_string()).unwrap_or_default();
        check_title(&mut check, &title);
        let due_date = parse_due_date(&mut check, self.due_date.as_deref());
        let tag = parse_tag(&mut check, self.tag.as_deref());
        check.finish()?;
        Ok(TaskInput {
            title,
            due_date,
            tag,
            note: clean_note(self.note),
        })
    }
}

impl UpdateTaskRequest {
    pub fn validate(self) -> Result<TaskPatch, AppError> {
        let mut check = FieldCheck::new();

        let title = match self.title {
            None => None,
            Some(None) => {
                check.fail("title", TITLE_REQUIRED);
                None
            }
            Some(Some(t)) => {
                let t = t.trim().to_string();
                check_title(&mut check, &t);
                Some(t)
            }
        };
        let due_date = self
            .due_date
            .map(|d| parse_due_date(&mut check, d.as_deref()));
        let tag = self.tag.map(|t| parse_tag(&mut check, t.as_deref()));
        let note = self.note.map(clean_note);

        check.finish()?;
        Ok(TaskPatch {
            title,
            due_date,
            tag,
            note,
        })
    }
}

impl ListTasksQuery {
    /// `isCompleted` other than `true`/`false` is ignored; an unknown tag is a 400.
    pub fn into_filter(self) -> Result<TaskFilter, AppError> {
        let is_completed = match self.is_completed.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };
        let tag = match self.tag.as_deref().filter(|t| !t.is_empty()) {
            None => None,
            Some(raw) => {
                let mut check = FieldCheck::new();
                let tag = parse_tag(&mut check, Some(raw));
                check.finish()?;
                tag
            }
        };
        Ok(TaskFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            is_completed,
            tag,
        })
    }
}
