//! Resolution of the feed access token.

use std::{
    env::VarError,
    fmt::Display,
    path::{Path, PathBuf},
};

use eyre::Context;
use secrecy::{ExposeSecret, SecretString};

/// Environment variable the access token is read from.
pub const ACCESS_TOKEN_ENV: &str = "AQI_API_KEY";
/// File in the secrets directory the access token is read from.
pub const ACCESS_TOKEN_FILE: &str = "aqi_api_key";
/// The feed's public demo token. Only intended for local development, it is heavily rate limited
/// and only serves a handful of stations.
pub const DEVELOPMENT_ACCESS_TOKEN: &str = "demo";

/// Where the access token was obtained from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenSource {
    /// Command line argument or options file.
    Explicit,
    Environment,
    File(PathBuf),
    DevelopmentFallback,
}

impl Display for AccessTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessTokenSource::Explicit => f.write_str("options"),
            AccessTokenSource::Environment => {
                write!(f, "{} environment variable", ACCESS_TOKEN_ENV)
            }
            AccessTokenSource::File(path) => write!(f, "file {:?}", path),
            AccessTokenSource::DevelopmentFallback => f.write_str("development fallback"),
        }
    }
}

pub struct AccessToken {
    pub token: SecretString,
    pub source: AccessTokenSource,
}

fn non_empty(token: &str) -> Option<SecretString> {
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(SecretString::new(token.to_owned()))
    }
}

/// Pick the access token with the highest precedence: `explicit`, then the environment variable,
/// then the secrets file, then [`DEVELOPMENT_ACCESS_TOKEN`]. Empty values are skipped.
fn resolve_access_token(
    explicit: Option<&SecretString>,
    environment: Result<String, VarError>,
    file: Option<(PathBuf, String)>,
) -> eyre::Result<AccessToken> {
    if let Some(token) = explicit.and_then(|token| non_empty(token.expose_secret())) {
        return Ok(AccessToken {
            token,
            source: AccessTokenSource::Explicit,
        });
    }

    match environment {
        Ok(token) => {
            if let Some(token) = non_empty(&token) {
                return Ok(AccessToken {
                    token,
                    source: AccessTokenSource::Environment,
                });
            }
        }
        Err(VarError::NotPresent) => {}
        Err(unexpected) => {
            return Err(unexpected).wrap_err_with(|| {
                format!("Error reading {} environment variable", ACCESS_TOKEN_ENV)
            })
        }
    }

    if let Some((path, contents)) = file {
        if let Some(token) = non_empty(&contents) {
            return Ok(AccessToken {
                token,
                source: AccessTokenSource::File(path),
            });
        }
    }

    Ok(AccessToken {
        token: SecretString::new(DEVELOPMENT_ACCESS_TOKEN.to_owned()),
        source: AccessTokenSource::DevelopmentFallback,
    })
}

async fn read_token_file(secrets_dir: &Path) -> eyre::Result<Option<(PathBuf, String)>> {
    let path = secrets_dir.join(ACCESS_TOKEN_FILE);
    if !path.is_file() {
        tracing::debug!("No access token file {:?}", path);
        return Ok(None);
    }
    let contents = tokio::fs::read_to_string(&path)
        .await
        .wrap_err_with(|| format!("Error reading access token file {:?}", path))?;
    Ok(Some((path, contents)))
}

async fn obtain_access_token(
    explicit: Option<&SecretString>,
    environment: Result<String, VarError>,
    secrets_dir: &Path,
) -> eyre::Result<AccessToken> {
    let file = read_token_file(secrets_dir).await?;
    let access_token = resolve_access_token(explicit, environment, file)?;

    if access_token.source == AccessTokenSource::DevelopmentFallback {
        tracing::warn!(
            "No access token configured, using the development token `{}`. Set {} or the \
            `access_token` option for production use.",
            DEVELOPMENT_ACCESS_TOKEN,
            ACCESS_TOKEN_ENV
        );
    } else {
        tracing::debug!("Access token read from {}", access_token.source);
    }

    Ok(access_token)
}

/// Obtain the feed access token, see [`resolve_access_token()`] for precedence.
pub async fn initialize_access_token(
    explicit: Option<&SecretString>,
    secrets_dir: &Path,
) -> eyre::Result<AccessToken> {
    obtain_access_token(explicit, std::env::var(ACCESS_TOKEN_ENV), secrets_dir).await
}

#[cfg(test)]
mod test {
    use std::{env::VarError, path::PathBuf};

    use secrecy::{ExposeSecret, SecretString};

    use super::{
        obtain_access_token, read_token_file, resolve_access_token, AccessTokenSource,
        ACCESS_TOKEN_FILE, DEVELOPMENT_ACCESS_TOKEN,
    };

    fn file() -> Option<(PathBuf, String)> {
        Some((PathBuf::from("secrets/aqi_api_key"), "file-token\n".to_owned()))
    }

    #[test]
    fn explicit_takes_precedence() {
        let explicit = SecretString::new("explicit-token".to_owned());
        let token =
            resolve_access_token(Some(&explicit), Ok("env-token".to_owned()), file()).unwrap();
        assert_eq!(AccessTokenSource::Explicit, token.source);
        assert_eq!("explicit-token", token.token.expose_secret());
    }

    #[test]
    fn environment_before_file() {
        let token = resolve_access_token(None, Ok("env-token".to_owned()), file()).unwrap();
        assert_eq!(AccessTokenSource::Environment, token.source);
        assert_eq!("env-token", token.token.expose_secret());
    }

    #[test]
    fn file_before_fallback() {
        let token = resolve_access_token(None, Err(VarError::NotPresent), file()).unwrap();
        assert_eq!(
            AccessTokenSource::File(PathBuf::from("secrets/aqi_api_key")),
            token.source
        );
        assert_eq!("file-token", token.token.expose_secret());
    }

    #[test]
    fn development_fallback() {
        let token = resolve_access_token(None, Err(VarError::NotPresent), None).unwrap();
        assert_eq!(AccessTokenSource::DevelopmentFallback, token.source);
        assert_eq!(DEVELOPMENT_ACCESS_TOKEN, token.token.expose_secret());
    }

    #[test]
    fn empty_values_are_skipped() {
        let explicit = SecretString::new("  ".to_owned());
        let token = resolve_access_token(
            Some(&explicit),
            Ok(String::new()),
            Some((PathBuf::from("secrets/aqi_api_key"), "\n".to_owned())),
        )
        .unwrap();
        assert_eq!(AccessTokenSource::DevelopmentFallback, token.source);
    }

    #[test]
    fn invalid_environment_value() {
        let invalid = VarError::NotUnicode(std::ffi::OsString::from("x"));
        assert!(resolve_access_token(None, Err(invalid), None).is_err());
    }

    #[tokio::test]
    async fn token_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_token_file(dir.path()).await.unwrap().is_none());

        std::fs::write(dir.path().join(ACCESS_TOKEN_FILE), "file-token\n").unwrap();
        let (path, contents) = read_token_file(dir.path()).await.unwrap().unwrap();
        assert_eq!(dir.path().join(ACCESS_TOKEN_FILE), path);
        assert_eq!("file-token\n", contents);
    }

    #[tokio::test]
    async fn blank_settings_fall_through_to_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ACCESS_TOKEN_FILE), "file-token\n").unwrap();

        let blank = SecretString::new("  ".to_owned());
        let token = obtain_access_token(Some(&blank), Ok(String::new()), dir.path())
            .await
            .unwrap();
        assert_eq!(
            AccessTokenSource::File(dir.path().join(ACCESS_TOKEN_FILE)),
            token.source
        );
        assert_eq!("file-token", token.token.expose_secret());

        let token = obtain_access_token(None, Err(VarError::NotPresent), dir.path())
            .await
            .unwrap();
        assert_eq!("file-token", token.token.expose_secret());
    }

    #[tokio::test]
    async fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ACCESS_TOKEN_FILE), "file-token\n").unwrap();

        let token = obtain_access_token(None, Ok("env-token".to_owned()), dir.path())
            .await
            .unwrap();
        assert_eq!(AccessTokenSource::Environment, token.source);
        assert_eq!("env-token", token.token.expose_secret());
    }

    #[tokio::test]
    async fn no_settings_use_development_token() {
        let dir = tempfile::tempdir().unwrap();
        let token = obtain_access_token(None, Err(VarError::NotPresent), dir.path())
            .await
            .unwrap();
        assert_eq!(AccessTokenSource::DevelopmentFallback, token.source);
    }
}
