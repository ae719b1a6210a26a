//! crates/campus_portal_core/src/routes.rs
//!
//! The route gate: the pure decision function mapping (session, profile,
//! requested path) to an allow/redirect outcome, and the role-conditional
//! navigation menus.

use crate::domain::{Profile, Role, Session};

/// The path of the sign-in screen.
pub const AUTH_PATH: &str = "/auth";
/// The path of the mandatory profile-completion screen.
pub const COMPLETE_PROFILE_PATH: &str = "/complete-profile";

/// Paths reachable without a session.
const PUBLIC_PATHS: &[&str] = &["/", AUTH_PATH];

/// The outcome of a route-gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Allow,
    Redirect(&'static str),
}

/// Decides whether the current session may reach `path`.
///
/// Evaluated in precedence order:
/// 1. no session: protected paths redirect to the sign-in screen;
/// 2. session but incomplete profile: everything except the completion
///    screen redirects there;
/// 3. session and complete profile: allow.
///
/// The check is pure and re-evaluated on every navigation, so profile
/// completion unblocks protected paths without any cached flag going stale.
pub fn resolve_route_access(
    path: &str,
    session: Option<&Session>,
    profile: Option<&Profile>,
) -> RouteAccess {
    if session.is_none() {
        if PUBLIC_PATHS.contains(&path) {
            return RouteAccess::Allow;
        }
        return RouteAccess::Redirect(AUTH_PATH);
    }

    let complete = profile.map(Profile::is_complete).unwrap_or(false);
    if !complete {
        if path == COMPLETE_PROFILE_PATH {
            return RouteAccess::Allow;
        }
        return RouteAccess::Redirect(COMPLETE_PROFILE_PATH);
    }

    RouteAccess::Allow
}

/// One entry in the sidebar navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub name: &'static str,
    pub href: &'static str,
}

const STUDENT_NAVIGATION: &[NavEntry] = &[
    NavEntry { name: "Dashboard", href: "/dashboard" },
    NavEntry { name: "Raise Ticket", href: "/tickets/new" },
    NavEntry { name: "My Tickets", href: "/tickets" },
    NavEntry { name: "Announcements", href: "/announcements" },
    NavEntry { name: "Permissions", href: "/permissions" },
    NavEntry { name: "AI Assistant", href: "/ai-assistant" },
];

const FACULTY_NAVIGATION: &[NavEntry] = &[
    NavEntry { name: "Dashboard", href: "/dashboard" },
    NavEntry { name: "All Tickets", href: "/admin/tickets" },
    NavEntry { name: "Manage Announcements", href: "/admin/announcements" },
    NavEntry { name: "Permission Requests", href: "/admin/permissions" },
    NavEntry { name: "Analytics", href: "/admin/analytics" },
    NavEntry { name: "AI Assistant", href: "/ai-assistant" },
];

/// Selects the navigation menu for a role. Students get the self-service
/// menu; faculty and admins share the management menu. The match is
/// exhaustive so a new role is a compile-time change.
pub fn navigation_for(role: Role) -> &'static [NavEntry] {
    match role {
        Role::Student => STUDENT_NAVIGATION,
        Role::Faculty | Role::Admin => FACULTY_NAVIGATION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "asha@campus.edu".to_string(),
            token: "tok".to_string(),
        }
    }

    fn profile(complete: bool) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            full_name: "Asha Rao".to_string(),
            email: "asha@campus.edu".to_string(),
            role: complete.then_some(Role::Student),
            student_id: complete.then(|| "S-100".to_string()),
            department: complete.then(|| "CSE".to_string()),
            year_of_study: None,
            phone_number: None,
        }
    }

    #[test]
    fn no_session_redirects_protected_paths_to_sign_in() {
        for path in ["/dashboard", "/tickets", "/admin/analytics", COMPLETE_PROFILE_PATH] {
            assert_eq!(
                resolve_route_access(path, None, None),
                RouteAccess::Redirect(AUTH_PATH),
                "path {path}"
            );
        }
    }

    #[test]
    fn no_session_still_allows_public_paths() {
        assert_eq!(resolve_route_access("/", None, None), RouteAccess::Allow);
        assert_eq!(resolve_route_access(AUTH_PATH, None, None), RouteAccess::Allow);
    }

    #[test]
    fn incomplete_profile_redirects_everything_except_completion() {
        let s = session();
        let p = profile(false);
        for path in ["/dashboard", "/announcements", AUTH_PATH, "/"] {
            assert_eq!(
                resolve_route_access(path, Some(&s), Some(&p)),
                RouteAccess::Redirect(COMPLETE_PROFILE_PATH),
                "path {path}"
            );
        }
        assert_eq!(
            resolve_route_access(COMPLETE_PROFILE_PATH, Some(&s), Some(&p)),
            RouteAccess::Allow
        );
    }

    #[test]
    fn missing_profile_counts_as_incomplete() {
        let s = session();
        assert_eq!(
            resolve_route_access("/dashboard", Some(&s), None),
            RouteAccess::Redirect(COMPLETE_PROFILE_PATH)
        );
    }

    #[test]
    fn complete_profile_allows_protected_paths() {
        let s = session();
        let p = profile(true);
        for path in ["/dashboard", "/tickets/new", "/admin/tickets", "/ai-assistant"] {
            assert_eq!(
                resolve_route_access(path, Some(&s), Some(&p)),
                RouteAccess::Allow,
                "path {path}"
            );
        }
    }

    #[test]
    fn menus_are_selected_by_role() {
        let student = navigation_for(Role::Student);
        assert!(student.iter().any(|e| e.href == "/tickets/new"));
        assert!(!student.iter().any(|e| e.href == "/admin/tickets"));

        // Faculty and admins share the management menu.
        assert_eq!(navigation_for(Role::Faculty), navigation_for(Role::Admin));
        assert!(navigation_for(Role::Faculty).iter().any(|e| e.href == "/admin/analytics"));
    }
}
