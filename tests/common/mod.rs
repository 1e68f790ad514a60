#![allow(dead_code)]

use std::env;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use fake::Fake;
use fake::faker::name::en::Name;
use uuid::Uuid;

use leavekeeper::AppError;
use leavekeeper::config::Config;
use leavekeeper::database::memory::InMemoryStore;
use leavekeeper::database::models::{Employee, LeaveRequestInput, LeaveType, Organization};
use leavekeeper::services::{LeaveService, Notifier};

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "debug");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn request(leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveRequestInput {
    LeaveRequestInput {
        leave_type,
        start_date: start,
        end_date: end,
        description: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Keeps every notification so tests can assert on recipients.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.to).collect()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn send(&self, to: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
        Err(AppError::NotificationFailed(format!("mailbox {} unavailable", to)))
    }
}

/// A small organization:
///
/// ```text
/// head@acme.test
/// ├── lead@acme.test
/// │   ├── ada@acme.test
/// │   └── bob@acme.test
/// └── ops@acme.test
/// ```
pub struct TestOrg {
    pub store: InMemoryStore,
    pub organization_id: Uuid,
}

pub const HEAD: &str = "head@acme.test";
pub const LEAD: &str = "lead@acme.test";
pub const ADA: &str = "ada@acme.test";
pub const BOB: &str = "bob@acme.test";
pub const OPS: &str = "ops@acme.test";

impl TestOrg {
    pub async fn new(annual_pto: i32) -> Self {
        let store = InMemoryStore::new();
        let organization = Organization::new("Acme");
        let organization_id = organization.id;
        store.add_organization(organization).await;

        for (id, manager) in [
            (HEAD, None),
            (LEAD, Some(HEAD)),
            (ADA, Some(LEAD)),
            (BOB, Some(LEAD)),
            (OPS, Some(HEAD)),
        ] {
            store
                .add_employee(Employee {
                    id: id.to_string(),
                    name: Name().fake(),
                    country: "GB".to_string(),
                    annual_pto,
                    manager_id: manager.map(str::to_string),
                    organization_id,
                    is_admin: id == HEAD,
                })
                .await;
        }

        Self {
            store,
            organization_id,
        }
    }

    pub fn service<N: Notifier>(
        &self,
        notifier: N,
    ) -> LeaveService<InMemoryStore, InMemoryStore, N> {
        LeaveService::new(
            self.store.clone(),
            self.store.clone(),
            notifier,
            &Config::default(),
        )
    }
}
