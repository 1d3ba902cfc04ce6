use crate::models::{Role, Session};

/// Outcome of checking a navigation against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Allow,
    RedirectToLogin { return_to: String },
    Forbidden { home: &'static str },
    NotFound,
}

pub const LOGIN_PATH: &str = "/login";

const PUBLIC_ROUTES: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/forgot-password",
    "/events",
    "/events/:id",
    "/services",
    "/services/:id",
    "/vendors/:id",
];

const ADMIN_ROUTES: &[&str] = &[
    "/admin/dashboard",
    "/admin/categories",
    "/admin/categories/new",
    "/admin/categories/:id/edit",
    "/admin/vendors",
    "/admin/vendors/applications",
    "/admin/vendors/:id",
    "/admin/notifications",
];

const VENDOR_ROUTES: &[&str] = &[
    "/vendor/dashboard",
    "/vendor/bookings",
    "/vendor/services",
    "/vendor/services/new",
    "/vendor/services/:id/edit",
    "/vendor/events",
    "/vendor/events/new",
    "/vendor/events/:id/edit",
    "/vendor/chat",
    "/vendor/chat/:id",
    "/vendor/notifications",
    "/vendor/profile",
];

const CLIENT_ROUTES: &[&str] = &[
    "/client/dashboard",
    "/client/bookings",
    "/client/tickets",
    "/client/chat",
    "/client/chat/:id",
    "/client/notifications",
    "/client/profile",
];

impl Role {
    pub fn routes(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => ADMIN_ROUTES,
            Role::Vendor => VENDOR_ROUTES,
            Role::Client => CLIENT_ROUTES,
        }
    }

    pub fn home(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Vendor => "/vendor/dashboard",
            Role::Client => "/client/dashboard",
        }
    }
}

/// `:name` segments match any single non-empty segment.
fn matches(pattern: &str, path: &str) -> bool {
    let mut pat = pattern.split('/').filter(|s| !s.is_empty());
    let mut segs = path.split('/').filter(|s| !s.is_empty());
    loop {
        match (pat.next(), segs.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') || p == s => continue,
            _ => return false,
        }
    }
}

fn owner(path: &str) -> Option<Role> {
    [Role::Admin, Role::Vendor, Role::Client]
        .into_iter()
        .find(|role| role.routes().iter().any(|r| matches(r, path)))
}

/// Decides whether `path` may be shown for `session`. Public pages are always
/// allowed; role pages need a session of that role.
pub fn gate(path: &str, session: Option<&Session>) -> Gate {
    let path = path.split(['?', '#']).next().unwrap_or_default();

    if PUBLIC_ROUTES.iter().any(|r| matches(r, path)) {
        return Gate::Allow;
    }

    let Some(required) = owner(path) else {
        return Gate::NotFound;
    };

    match session {
        None => Gate::RedirectToLogin {
            return_to: path.to_string(),
        },
        Some(s) if s.role == required => Gate::Allow,
        Some(s) => {
            tracing::debug!(path, role = s.role.as_str(), "route forbidden for role");
            Gate::Forbidden { home: s.role.home() }
        }
    }
}
