//! Application identity resolution.
//!
//! A caller-supplied id is verified to exist; a name is resolved through
//! the name-search endpoint and must match exactly one application. The
//! result is cached for the lifetime of the run.

use contrastverify_types::ApplicationRecord;

use crate::client::{ApiError, TeamServerApi};
use crate::config::Config;
use crate::output::OutputHelper;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(
        "Unable to find application with ID {app_id} - check the ID and ensure the user \
         account this action uses can access it - {source}"
    )]
    IdNotFound {
        app_id: String,
        #[source]
        source: ApiError,
    },

    #[error(
        "Could not match one app with name \"{app_name}\", found {found}, \
         consider using APP_ID input instead."
    )]
    NameMatch { app_name: String, found: usize },

    #[error("no application id or name configured")]
    MissingIdentity,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Memoizing resolver: the lookup runs once, later calls return the cached id.
pub struct AppResolver<'a> {
    api: &'a dyn TeamServerApi,
    app_id: Option<String>,
    app_name: Option<String>,
    resolved: Option<String>,
}

impl<'a> AppResolver<'a> {
    pub fn new(api: &'a dyn TeamServerApi, config: &Config) -> Self {
        Self {
            api,
            app_id: config.app_id.clone(),
            app_name: config.app_name.clone(),
            resolved: None,
        }
    }

    /// Idempotent resolve: verifies or looks up the application id on the
    /// first call and returns the remembered value afterwards.
    pub fn resolve(&mut self, out: &OutputHelper) -> Result<String, ResolveError> {
        if let Some(resolved) = &self.resolved {
            return Ok(resolved.clone());
        }
        let resolved = self.determine(out)?;
        self.resolved = Some(resolved.clone());
        Ok(resolved)
    }

    fn determine(&self, out: &OutputHelper) -> Result<String, ResolveError> {
        if let Some(app_id) = &self.app_id {
            self.api
                .application_exists(app_id)
                .map_err(|source| ResolveError::IdNotFound {
                    app_id: app_id.clone(),
                    source,
                })?;
            out.info(&format!("Using provided application ID {app_id}"));
            return Ok(app_id.clone());
        }

        let Some(app_name) = &self.app_name else {
            return Err(ResolveError::MissingIdentity);
        };

        let found = self.api.applications_by_name(app_name)?;
        let matching: Vec<&ApplicationRecord> = found
            .applications
            .iter()
            .filter(|application| application.name == *app_name)
            .collect();

        match matching.as_slice() {
            [single] => {
                out.info(&format!(
                    "Application ID for \"{app_name}\" is {}",
                    single.app_id
                ));
                Ok(single.app_id.clone())
            }
            other => Err(ResolveError::NameMatch {
                app_name: app_name.clone(),
                found: other.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::tests::FakeApi;
    use contrastverify_types::ApplicationsByName;
    use std::collections::HashMap;

    fn quiet_output() -> OutputHelper {
        OutputHelper::from_env()
    }

    fn config_with(app_id: Option<&str>, app_name: Option<&str>) -> Config {
        let mut env: HashMap<String, String> = [
            ("API_KEY", "k"),
            ("ORG_ID", "o"),
            ("AUTH_HEADER", "h"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        if let Some(id) = app_id {
            env.insert("APP_ID".to_string(), id.to_string());
        }
        if let Some(name) = app_name {
            env.insert("APP_NAME".to_string(), name.to_string());
        }
        crate::config::resolve_config(&env).unwrap()
    }

    #[test]
    fn verifies_and_caches_a_supplied_id() {
        let api = FakeApi::default();
        let config = config_with(Some("an_app_uuid"), None);
        let mut resolver = AppResolver::new(&api, &config);
        let out = quiet_output();

        assert_eq!(resolver.resolve(&out).unwrap(), "an_app_uuid");
        assert_eq!(resolver.resolve(&out).unwrap(), "an_app_uuid");
        // the existence check ran once, not twice
        assert_eq!(*api.exists_calls.borrow(), 1);
    }

    #[test]
    fn invalid_id_is_fatal_and_names_the_id() {
        let api = FakeApi {
            application_missing: true,
            ..FakeApi::default()
        };
        let config = config_with(Some("an_app_uuid"), None);
        let mut resolver = AppResolver::new(&api, &config);

        let err = resolver.resolve(&quiet_output()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(
            "Unable to find application with ID an_app_uuid - check the ID and ensure \
             the user account this action uses can access it"
        ));
    }

    #[test]
    fn resolves_a_single_exact_name_match() {
        let api = FakeApi {
            applications: ApplicationsByName {
                applications: vec![
                    ApplicationRecord {
                        name: "VerifierTest".to_string(),
                        app_id: "verifier_app_uuid".to_string(),
                    },
                    ApplicationRecord {
                        name: "VerifierTestStaging".to_string(),
                        app_id: "other_uuid".to_string(),
                    },
                ],
            },
            ..FakeApi::default()
        };
        let config = config_with(None, Some("VerifierTest"));
        let mut resolver = AppResolver::new(&api, &config);

        assert_eq!(
            resolver.resolve(&quiet_output()).unwrap(),
            "verifier_app_uuid"
        );
    }

    #[test]
    fn zero_exact_matches_is_fatal_with_count() {
        let api = FakeApi {
            applications: ApplicationsByName {
                applications: vec![ApplicationRecord {
                    name: "NonExactMatch".to_string(),
                    app_id: "uuid".to_string(),
                }],
            },
            ..FakeApi::default()
        };
        let config = config_with(None, Some("NonExistentApp"));
        let mut resolver = AppResolver::new(&api, &config);

        let err = resolver.resolve(&quiet_output()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not match one app with name \"NonExistentApp\", found 0, \
             consider using APP_ID input instead."
        );
    }

    #[test]
    fn multiple_exact_matches_is_fatal_with_count() {
        let duplicate = ApplicationRecord {
            name: "VerifierTest".to_string(),
            app_id: "uuid".to_string(),
        };
        let api = FakeApi {
            applications: ApplicationsByName {
                applications: vec![duplicate.clone(), duplicate],
            },
            ..FakeApi::default()
        };
        let config = config_with(None, Some("VerifierTest"));
        let mut resolver = AppResolver::new(&api, &config);

        let err = resolver.resolve(&quiet_output()).unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let api = FakeApi {
            applications: ApplicationsByName {
                applications: vec![ApplicationRecord {
                    name: "verifiertest".to_string(),
                    app_id: "uuid".to_string(),
                }],
            },
            ..FakeApi::default()
        };
        let config = config_with(None, Some("VerifierTest"));
        let mut resolver = AppResolver::new(&api, &config);

        let err = resolver.resolve(&quiet_output()).unwrap_err();
        assert!(err.to_string().contains("found 0"));
    }
}
