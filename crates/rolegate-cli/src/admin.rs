use serde::Deserialize;

use rolegate_core::engine::{AdminCheck, AuthzError};
use rolegate_core::entity::SubjectId;

/// Access rights of an ACL grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclRight {
    Read,
    Add,
    Edit,
    Delete,
}

/// One ACL grant: `subject` holds `rights` on `location` within `app`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AclEntry {
    pub subject: i64,
    pub app: String,
    pub location: String,
    pub rights: Vec<AclRight>,
}

impl AclEntry {
    fn grants(&self, subject: SubjectId, location: &str, right: AclRight, app: &str) -> bool {
        self.subject == subject.value()
            && self.location == location
            && self.app == app
            && self.rights.contains(&right)
    }
}

/// Administrators are subjects allowed to run the admin application, or
/// allowed to add on the `admin` location of the scoped application.
#[derive(Debug, Clone, Default)]
pub struct AclAdminCheck {
    entries: Vec<AclEntry>,
}

impl AclAdminCheck {
    pub fn new(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    pub fn check(&self, subject: SubjectId, location: &str, right: AclRight, app: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.grants(subject, location, right, app))
    }
}

impl AdminCheck for AclAdminCheck {
    async fn is_administrator(&self, subject: SubjectId, scope: &str) -> Result<bool, AuthzError> {
        Ok(self.check(subject, "run", AclRight::Read, "admin")
            || self.check(subject, "admin", AclRight::Add, scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(subject: i64, app: &str, location: &str, rights: &[AclRight]) -> AclEntry {
        AclEntry {
            subject,
            app: app.to_string(),
            location: location.to_string(),
            rights: rights.to_vec(),
        }
    }

    #[tokio::test]
    async fn admin_app_runner_is_administrator_everywhere() {
        let acl = AclAdminCheck::new(vec![entry(1, "admin", "run", &[AclRight::Read])]);

        assert!(acl.is_administrator(SubjectId::new(1), "booking").await.unwrap());
        assert!(acl.is_administrator(SubjectId::new(1), "rental").await.unwrap());
        assert!(!acl.is_administrator(SubjectId::new(2), "booking").await.unwrap());
    }

    #[tokio::test]
    async fn app_admin_location_add_is_scoped() {
        let acl = AclAdminCheck::new(vec![entry(5, "booking", "admin", &[AclRight::Add])]);

        assert!(acl.is_administrator(SubjectId::new(5), "booking").await.unwrap());
        assert!(!acl.is_administrator(SubjectId::new(5), "rental").await.unwrap());
    }

    #[tokio::test]
    async fn wrong_right_is_not_enough() {
        let acl = AclAdminCheck::new(vec![
            entry(5, "booking", "admin", &[AclRight::Read, AclRight::Edit]),
            entry(5, "admin", "run", &[AclRight::Add]),
        ]);

        assert!(!acl.is_administrator(SubjectId::new(5), "booking").await.unwrap());
    }

    #[test]
    fn entries_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            acl: Vec<AclEntry>,
        }

        let parsed: Wrapper = toml::from_str(
            r#"
            [[acl]]
            subject = 1
            app = "admin"
            location = "run"
            rights = ["read"]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.acl, vec![entry(1, "admin", "run", &[AclRight::Read])]);
    }
}
