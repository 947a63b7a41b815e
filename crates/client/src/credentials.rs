//! The shared credential context, obtained once and reused by every handle.

use std::collections::HashMap;

use strato_config::{expand_home, AuthConfig, AuthMethod, InstanceConfig};
use strato_core::ToolError;
use tracing::info;

/// Resolved credential context for backend calls.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub tenancy: String,
    pub user: Option<String>,
    pub fingerprint: Option<String>,
    pub region: String,
    pub method: AuthMethod,
}

impl Credentials {
    /// Load the context for the configured auth method.
    ///
    /// Failures surface as Authentication and leave nothing cached.
    pub async fn load(auth: &AuthConfig, instance: &InstanceConfig) -> Result<Self, ToolError> {
        match auth.method {
            AuthMethod::AmbientIdentity => {
                info!("using ambient identity authentication");
                Ok(Self {
                    tenancy: instance.compartment_id.clone(),
                    user: None,
                    fingerprint: None,
                    region: instance.region.clone(),
                    method: AuthMethod::AmbientIdentity,
                })
            }
            AuthMethod::ConfigFile => {
                let path = expand_home(&auth.credentials_path);
                if !path.exists() {
                    return Err(ToolError::authentication("Credentials file not found")
                        .with_detail("credentials_path", path.display().to_string()));
                }

                let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                    ToolError::authentication("Failed to read credentials file")
                        .with_detail("credentials_path", path.display().to_string())
                        .with_source(e)
                })?;

                let profile = parse_profile(&content, &auth.profile)?;
                let tenancy = profile.get("tenancy").cloned().ok_or_else(|| {
                    ToolError::authentication("Credentials profile missing 'tenancy'")
                        .with_detail("profile", auth.profile.clone())
                })?;

                // Instance region wins over the profile default.
                let region = if instance.region.is_empty() {
                    profile.get("region").cloned().unwrap_or_default()
                } else {
                    instance.region.clone()
                };

                info!(
                    path = %path.display(),
                    profile = %auth.profile,
                    "loaded credentials from file"
                );

                Ok(Self {
                    tenancy,
                    user: profile.get("user").cloned(),
                    fingerprint: profile.get("fingerprint").cloned(),
                    region,
                    method: AuthMethod::ConfigFile,
                })
            }
        }
    }
}

/// Parse one `[PROFILE]` section of an INI-style credentials file.
fn parse_profile(content: &str, profile: &str) -> Result<HashMap<String, String>, ToolError> {
    let mut values = HashMap::new();
    let mut in_profile = false;
    let mut found = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_profile = section.trim() == profile;
            found = found || in_profile;
            continue;
        }
        if in_profile {
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    if !found {
        return Err(
            ToolError::authentication("Profile not found in credentials file")
                .with_detail("profile", profile),
        );
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strato_core::ErrorKind;

    const CREDENTIALS: &str = "\
# strato credentials
[DEFAULT]
tenancy = ten.aaaa1111
user = usr.bbbb2222
fingerprint = aa:bb:cc
region = ap-sydney-1

[ALT]
tenancy = ten.cccc3333
";

    #[test]
    fn test_parse_profile_reads_selected_section() {
        let values = parse_profile(CREDENTIALS, "ALT").unwrap();
        assert_eq!(values.get("tenancy").map(String::as_str), Some("ten.cccc3333"));
        assert!(values.get("user").is_none());
    }

    #[test]
    fn test_parse_profile_missing_section() {
        let err = parse_profile(CREDENTIALS, "MISSING").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.details["profile"], "MISSING");
    }

    #[test]
    fn test_parse_profile_skips_comments() {
        let values = parse_profile(CREDENTIALS, "DEFAULT").unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values.get("fingerprint").map(String::as_str), Some("aa:bb:cc"));
    }
}
