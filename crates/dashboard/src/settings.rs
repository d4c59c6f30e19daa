//! Dashboard settings: notifications, churn detection thresholds and
//! account details, persisted as a JSON document.
//!
//! The billing token and environment are not settings; they come from
//! configuration only.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use pulse_core::{PulseError, PulseResult};
use pulse_reporting::ChurnCriteria;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSettings {
    pub daily_report: bool,
    pub churn_alert: bool,
    pub default_alert: bool,
    pub notification_email: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            daily_report: true,
            churn_alert: true,
            default_alert: true,
            notification_email: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub name: String,
    pub email: String,
    pub company: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardSettings {
    pub notifications: NotificationSettings,
    pub churn: ChurnCriteria,
    pub account: AccountSettings,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Settings change audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsChange {
    pub section: String,
    pub old_value: serde_json::Value,
    pub new_value: serde_json::Value,
    pub changed_at: DateTime<Utc>,
}

/// Shared, file-backed settings.
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<DashboardSettings>,
    change_log: Mutex<Vec<SettingsChange>>,
}

impl SettingsStore {
    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> PulseResult<Self> {
        let path = path.into();
        let current = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| PulseError::Settings(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| PulseError::Settings(format!("{}: {e}", path.display())))?
        } else {
            DashboardSettings::default()
        };
        info!(path = %path.display(), "Settings loaded");

        Ok(Self {
            path,
            current: RwLock::new(current),
            change_log: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> DashboardSettings {
        self.current.read().clone()
    }

    pub fn churn_criteria(&self) -> ChurnCriteria {
        self.current.read().churn
    }

    pub fn update_notifications(&self, update: NotificationSettings) -> PulseResult<DashboardSettings> {
        let email = update.notification_email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            return Err(PulseError::Validation(format!(
                "invalid notification e-mail '{email}'"
            )));
        }
        self.apply("notifications", |s| {
            let old = json(&s.notifications);
            s.notifications = update;
            (old, json(&s.notifications))
        })
    }

    pub fn update_churn(&self, update: ChurnCriteria) -> PulseResult<DashboardSettings> {
        if update.inactivity_threshold < 1 {
            return Err(PulseError::Validation(
                "inactivity threshold must be at least 1 day".into(),
            ));
        }
        if update.payment_failures < 1 {
            return Err(PulseError::Validation(
                "payment failures threshold must be at least 1".into(),
            ));
        }
        if update.usage_threshold > 100 {
            return Err(PulseError::Validation(
                "usage threshold must be between 0 and 100".into(),
            ));
        }
        self.apply("churn", |s| {
            let old = json(&s.churn);
            s.churn = update;
            (old, json(&s.churn))
        })
    }

    pub fn update_account(&self, update: AccountSettings) -> PulseResult<DashboardSettings> {
        let email = update.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            return Err(PulseError::Validation(format!("invalid account e-mail '{email}'")));
        }
        self.apply("account", |s| {
            let old = json(&s.account);
            s.account = update;
            (old, json(&s.account))
        })
    }

    /// Changes since startup, oldest first.
    pub fn change_log(&self) -> Vec<SettingsChange> {
        self.change_log.lock().clone()
    }

    /// Mutate a copy, persist it, then publish. A failed write leaves the
    /// in-memory settings untouched.
    fn apply<F>(&self, section: &str, mutate: F) -> PulseResult<DashboardSettings>
    where
        F: FnOnce(&mut DashboardSettings) -> (serde_json::Value, serde_json::Value),
    {
        let mut current = self.current.write();
        let mut next = current.clone();
        let (old_value, new_value) = mutate(&mut next);
        next.updated_at = Some(Utc::now());
        persist(&self.path, &next)?;
        *current = next.clone();

        self.change_log.lock().push(SettingsChange {
            section: section.to_string(),
            old_value,
            new_value,
            changed_at: Utc::now(),
        });
        info!(section = section, "Settings saved");
        Ok(next)
    }
}

fn json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Write via a sibling temp file and rename, so readers never see a
/// half-written document.
fn persist(path: &Path, settings: &DashboardSettings) -> PulseResult<()> {
    let body = serde_json::to_vec_pretty(settings)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| PulseError::Settings(format!("{}: {e}", dir.display())))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(|e| PulseError::Settings(format!("{}: {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| PulseError::Settings(format!("{}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_defaults_when_missing() {
        let (_dir, store) = store();
        let settings = store.get();
        assert!(settings.notifications.daily_report);
        assert_eq!(settings.churn, ChurnCriteria::default());
        assert!(settings.updated_at.is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_churn_update_persists_and_reloads() {
        let (dir, store) = store();
        let criteria = ChurnCriteria {
            inactivity_threshold: 21,
            usage_threshold: 40,
            payment_failures: 3,
        };
        store.update_churn(criteria).unwrap();
        assert_eq!(store.churn_criteria().payment_failures, 3);

        let reopened = SettingsStore::open(dir.path().join("settings.json")).unwrap();
        assert_eq!(reopened.churn_criteria(), criteria);
        assert!(reopened.get().updated_at.is_some());
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        let (_dir, store) = store();
        let zero = ChurnCriteria {
            payment_failures: 0,
            ..ChurnCriteria::default()
        };
        assert!(matches!(store.update_churn(zero), Err(PulseError::Validation(_))));

        let usage = ChurnCriteria {
            usage_threshold: 101,
            ..ChurnCriteria::default()
        };
        assert!(matches!(store.update_churn(usage), Err(PulseError::Validation(_))));

        let notifications = NotificationSettings {
            notification_email: "not-an-email".into(),
            ..NotificationSettings::default()
        };
        assert!(matches!(
            store.update_notifications(notifications),
            Err(PulseError::Validation(_))
        ));
        assert!(store.change_log().is_empty());
        assert_eq!(store.get(), DashboardSettings::default());
    }

    #[test]
    fn test_change_log() {
        let (_dir, store) = store();
        store
            .update_account(AccountSettings {
                name: "Maria".into(),
                email: "maria@empresa.com.br".into(),
                company: "Pulse".into(),
            })
            .unwrap();
        store
            .update_notifications(NotificationSettings {
                daily_report: false,
                notification_email: "ops@empresa.com.br".into(),
                ..NotificationSettings::default()
            })
            .unwrap();

        let log = store.change_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].section, "account");
        assert_eq!(log[0].new_value["company"], "Pulse");
        assert_eq!(log[1].old_value["dailyReport"], true);
        assert_eq!(log[1].new_value["dailyReport"], false);
    }

    #[test]
    fn test_corrupt_file_is_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SettingsStore::open(&path),
            Err(PulseError::Settings(_))
        ));
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.com"));
        assert!(!looks_like_email("a b@c.com"));
    }
}
