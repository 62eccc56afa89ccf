use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubely_core::error::{detailed_message, ErrorMetadata, LogLevel};
use tubely_storage::ResolvedUrl;

/// Guess a media type from a file extension when none is given on the command line.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "mp4" | "m4v" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// JSON shape printed by `tubely resolve`.
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub url: String,
    pub signed: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ResolvedUrl> for ResolveReport {
    fn from(resolved: ResolvedUrl) -> Self {
        let signed = matches!(resolved, ResolvedUrl::Signed(_));
        let expires_at = resolved.expires_at();
        Self {
            url: resolved.into_string(),
            signed,
            expires_at,
        }
    }
}

/// JSON shape printed when an upload fails.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<&'static str>,
    /// Full source chain; omitted in production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorReport {
    pub fn new<E>(err: &E, is_production: bool) -> Self
    where
        E: ErrorMetadata + std::error::Error + 'static,
    {
        Self {
            error: err.client_message(),
            code: err.error_code(),
            status: err.http_status_code(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            details: if is_production {
                None
            } else {
                Some(detailed_message(err))
            },
        }
    }
}

/// Log an error at the level it asks for.
pub fn log_error<E>(err: &E)
where
    E: ErrorMetadata + std::error::Error + 'static,
{
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, code = code, "Upload failed"),
        LogLevel::Warn => tracing::warn!(error = %err, code = code, "Upload failed"),
        LogLevel::Error => {
            tracing::error!(error = %detailed_message(err), code = code, "Upload failed")
        }
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays machine-readable.
///
/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tubely=debug,info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
