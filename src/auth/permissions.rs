use anyhow::Error;
use once_cell::sync::Lazy;
use rocket::serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewMatches,
    UseMessaging,
    ViewDashboard,

    ManageNeeds,
    ManageTeam,
    ActAsCoach,

    ManageWrestlers,
    ManageInterests,
    ActAsParent,

    ActForAnyParty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Coach,
    Parent,
    Athlete,
    Admin,
}

static ATHLETE_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewMatches);
    permissions.insert(Permission::UseMessaging);
    permissions.insert(Permission::ViewDashboard);

    permissions
});

static COACH_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(ATHLETE_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ManageNeeds);
    permissions.insert(Permission::ManageTeam);
    permissions.insert(Permission::ActAsCoach);

    permissions
});

static PARENT_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(ATHLETE_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ManageWrestlers);
    permissions.insert(Permission::ManageInterests);
    permissions.insert(Permission::ActAsParent);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(COACH_PERMISSIONS.iter().copied());
    permissions.extend(PARENT_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ActForAnyParty);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Coach => &COACH_PERMISSIONS,
            Role::Parent => &PARENT_PERMISSIONS,
            Role::Athlete => &ATHLETE_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Coach => "coach",
            Role::Parent => "parent",
            Role::Athlete => "athlete",
            Role::Admin => "admin",
        }
    }

    // The identity provider has written both casings over time.
    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "coach" => Ok(Role::Coach),
            "parent" => Ok(Role::Parent),
            "athlete" => Ok(Role::Athlete),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(Role::from_str("Coach").unwrap(), Role::Coach);
        assert_eq!(Role::from_str("parent").unwrap(), Role::Parent);
        assert!(Role::from_str("referee").is_err());
    }

    #[test]
    fn each_side_only_acts_for_itself() {
        assert!(Role::Coach.has_permission(Permission::ActAsCoach));
        assert!(!Role::Coach.has_permission(Permission::ActAsParent));
        assert!(Role::Parent.has_permission(Permission::ActAsParent));
        assert!(!Role::Parent.has_permission(Permission::ManageNeeds));
        assert!(!Role::Parent.has_permission(Permission::ManageTeam));
        assert!(!Role::Athlete.has_permission(Permission::ActAsParent));
        assert!(Role::Athlete.has_permission(Permission::UseMessaging));
    }

    #[test]
    fn admin_holds_every_permission() {
        for role in [Role::Coach, Role::Parent, Role::Athlete] {
            for permission in role.permissions() {
                assert!(Role::Admin.has_permission(*permission));
            }
        }
        assert!(Role::Admin.has_permission(Permission::ActForAnyParty));
    }
}
