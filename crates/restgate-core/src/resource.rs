//! Declarative protection of resource routes.

use serde::Deserialize;

/// Protection settings of one route group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteProtection {
    #[serde(default)]
    pub protected: bool,
    /// Only meaningful when `protected` is set. Absent means any
    /// authenticated principal.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl RouteProtection {
    /// Open to anyone.
    pub fn public() -> Self {
        Self::default()
    }

    /// Any authenticated principal.
    pub fn authenticated() -> Self {
        Self {
            protected: true,
            roles: None,
        }
    }

    /// Authenticated principals holding one of `roles`.
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected: true,
            roles: Some(roles.into_iter().map(Into::into).collect()),
        }
    }
}

/// Configuration of a resource: route protection and response field filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
    /// Applied to every route when present, overriding per-route entries.
    pub global: Option<RouteProtection>,
    pub list: Option<RouteProtection>,
    pub get: Option<RouteProtection>,
    pub post: Option<RouteProtection>,
    pub put: Option<RouteProtection>,
    pub delete: Option<RouteProtection>,
    /// Fields stripped from every returned document.
    #[serde(default)]
    pub filter: Vec<String>,
}

impl ResourceConfig {
    pub fn global(protection: RouteProtection) -> Self {
        Self {
            global: Some(protection),
            ..Self::default()
        }
    }

    pub fn with_route(mut self, key: RouteKey, protection: RouteProtection) -> Self {
        let slot = match key {
            RouteKey::List => &mut self.list,
            RouteKey::Get => &mut self.get,
            RouteKey::Post => &mut self.post,
            RouteKey::Put => &mut self.put,
            RouteKey::Delete => &mut self.delete,
        };
        *slot = Some(protection);
        self
    }

    pub fn with_filter<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = fields.into_iter().map(Into::into).collect();
        self
    }

    fn route(&self, key: RouteKey) -> Option<&RouteProtection> {
        match key {
            RouteKey::List => self.list.as_ref(),
            RouteKey::Get => self.get.as_ref(),
            RouteKey::Post => self.post.as_ref(),
            RouteKey::Put => self.put.as_ref(),
            RouteKey::Delete => self.delete.as_ref(),
        }
    }
}

/// The five generated routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKey {
    List,
    Get,
    Post,
    Put,
    Delete,
}

impl RouteKey {
    pub const ALL: [RouteKey; 5] = [
        RouteKey::List,
        RouteKey::Get,
        RouteKey::Post,
        RouteKey::Put,
        RouteKey::Delete,
    ];

    pub fn method(self) -> &'static str {
        match self {
            RouteKey::List | RouteKey::Get => "GET",
            RouteKey::Post => "POST",
            RouteKey::Put => "PUT",
            RouteKey::Delete => "DELETE",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            RouteKey::List | RouteKey::Post => "/",
            RouteKey::Get | RouteKey::Put | RouteKey::Delete => "/{id}",
        }
    }
}

/// Resolved protection of one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveConfig {
    Public,
    Authenticated,
    Restricted(Vec<String>),
}

/// `global` wins over the per-route entry; no entry at all means public.
pub fn resolve_route_config(config: &ResourceConfig, key: RouteKey) -> EffectiveConfig {
    let protection = config.global.as_ref().or_else(|| config.route(key));

    match protection {
        Some(RouteProtection {
            protected: true,
            roles: Some(roles),
        }) => EffectiveConfig::Restricted(roles.clone()),
        Some(RouteProtection {
            protected: true,
            roles: None,
        }) => EffectiveConfig::Authenticated,
        _ => EffectiveConfig::Public,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_public() {
        let config = ResourceConfig::default();
        for key in RouteKey::ALL {
            assert_eq!(resolve_route_config(&config, key), EffectiveConfig::Public);
        }
    }

    #[test]
    fn test_global_overrides_routes() {
        let config = ResourceConfig::global(RouteProtection::roles(["ADMIN", "USER"]))
            .with_route(RouteKey::Delete, RouteProtection::public());

        for key in RouteKey::ALL {
            assert_eq!(
                resolve_route_config(&config, key),
                EffectiveConfig::Restricted(vec!["ADMIN".to_string(), "USER".to_string()])
            );
        }
    }

    #[test]
    fn test_per_route_entries() {
        let config = ResourceConfig::default()
            .with_route(RouteKey::List, RouteProtection::authenticated())
            .with_route(RouteKey::Delete, RouteProtection::roles(["ADMIN"]));

        assert_eq!(
            resolve_route_config(&config, RouteKey::List),
            EffectiveConfig::Authenticated
        );
        assert_eq!(
            resolve_route_config(&config, RouteKey::Delete),
            EffectiveConfig::Restricted(vec!["ADMIN".to_string()])
        );
        assert_eq!(
            resolve_route_config(&config, RouteKey::Get),
            EffectiveConfig::Public
        );
    }

    #[test]
    fn test_roles_ignored_when_unprotected() {
        let config = ResourceConfig::global(RouteProtection {
            protected: false,
            roles: Some(vec!["ADMIN".to_string()]),
        });

        assert_eq!(
            resolve_route_config(&config, RouteKey::Put),
            EffectiveConfig::Public
        );
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: ResourceConfig = serde_json::from_str(
            r#"{ "global": { "protected": true, "roles": ["ADMIN"] }, "filter": ["password"] }"#,
        )
        .unwrap();

        assert_eq!(config.filter, vec!["password".to_string()]);
        assert_eq!(
            resolve_route_config(&config, RouteKey::List),
            EffectiveConfig::Restricted(vec!["ADMIN".to_string()])
        );
    }
}
