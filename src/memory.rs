//! In-memory stores and canned enrichment providers for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::UserStore;
use crate::auth::repo_types::{NewUser, User};
use crate::db::{StoreError, StoreResult};
use crate::enrichment::{CityExtractor, WeatherData, WeatherProvider};
use crate::tasks::repo::TaskStore;
use crate::tasks::repo_types::{NewTask, Task, TaskFilter, TaskUpdate};

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().unwrap();
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("email"));
        }
        if users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict("username"));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: new.id,
            email: new.email,
            username: new.username,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }
}

/// Keeps insertion order, which doubles as creation order.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().unwrap();
        Ok(tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.read().unwrap();
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn insert(&self, new: NewTask) -> StoreResult<Task> {
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: new.id,
            user_id: new.user_id,
            title: new.title,
            is_completed: false,
            due_date: new.due_date,
            tag: new.tag,
            note: new.note,
            weather_city: new.weather_city,
            weather_data: new.weather_data,
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().unwrap().push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, update: &TaskUpdate) -> StoreResult<Task> {
        let mut tasks = self.tasks.write().unwrap();
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(title) = &update.title {
            slot.title = title.clone();
        }
        if let Some(due_date) = update.due_date {
            slot.due_date = due_date;
        }
        if let Some(tag) = update.tag {
            slot.tag = tag;
        }
        if let Some(note) = &update.note {
            slot.note = note.clone();
        }
        if let Some((city, weather)) = update.weather_columns() {
            slot.weather_city = city;
            slot.weather_data = weather;
        }
        slot.updated_at = OffsetDateTime::now_utc();
        Ok(slot.clone())
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> StoreResult<Task> {
        let mut tasks = self.tasks.write().unwrap();
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        slot.is_completed = completed;
        slot.updated_at = OffsetDateTime::now_utc();
        Ok(slot.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut tasks = self.tasks.write().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Answers every prompt with the same text, or fails.
#[derive(Debug)]
pub struct FixedCity {
    answer: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FixedCity {
    pub fn answer(text: &str) -> Self {
        Self {
            answer: Mutex::new(Some(text.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_answer(&self, text: &str) {
        *self.answer.lock().unwrap() = Some(text.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CityExtractor for FixedCity {
    async fn extract_city(&self, _text: &str) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.answer.lock().unwrap().clone();
        match answer {
            Some(a) => Ok(Some(a)),
            None => anyhow::bail!("model unavailable"),
        }
    }
}

#[derive(Debug)]
enum WeatherReply {
    Data(WeatherData),
    Nothing,
    Fail,
}

#[derive(Debug)]
pub struct FixedWeather {
    reply: WeatherReply,
    calls: AtomicUsize,
}

impl FixedWeather {
    fn with(reply: WeatherReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ok(data: WeatherData) -> Self {
        Self::with(WeatherReply::Data(data))
    }

    pub fn none() -> Self {
        Self::with(WeatherReply::Nothing)
    }

    pub fn failing() -> Self {
        Self::with(WeatherReply::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for FixedWeather {
    async fn current(&self, _city: &str) -> anyhow::Result<Option<WeatherData>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            WeatherReply::Data(d) => Ok(Some(d.clone())),
            WeatherReply::Nothing => Ok(None),
            WeatherReply::Fail => anyhow::bail!("weather api down"),
        }
    }
}
