//! `CREATE SECRET` compilation.

use crate::error::{CompileError, CompileErrorCode, CompileResult};
use crate::options::{check_key, render_value};
use crate::quote::{quote_ident, quote_literal};
use crate::statement::{Entity, EntityKind, Statement, REDACTED};
use duckalog_core::{OptionValue, Secret, SecretCredentials, SecretDefinition, SecretProvider};

/// Parameter list that tracks which values are credentials.
#[derive(Default)]
struct Params {
    plain: Vec<String>,
    redacted: Vec<String>,
    sensitive: Vec<String>,
}

impl Params {
    fn raw(&mut self, key: &str, value: impl Into<String>) {
        let rendered = format!("{} {}", key, value.into());
        self.plain.push(rendered.clone());
        self.redacted.push(rendered);
    }

    fn text(&mut self, key: &str, value: &Option<String>) {
        if let Some(value) = value {
            self.raw(key, quote_literal(value));
        }
    }

    fn secret(&mut self, key: &str, value: &Option<Secret>) {
        if let Some(value) = value {
            self.hidden(key, quote_literal(value.expose()), Some(value.expose()));
        }
    }

    /// Free-form options may carry tokens, so every value is hidden.
    fn option(&mut self, entity: &str, key: &str, value: &OptionValue) -> CompileResult<()> {
        check_key(entity, key)?;
        let rendered = render_value(entity, key, value)?;
        let text = match value {
            OptionValue::String(text) => Some(text.as_str()),
            _ => None,
        };
        self.hidden(&key.to_ascii_uppercase(), rendered, text);
        Ok(())
    }

    fn hidden(&mut self, key: &str, rendered: String, text: Option<&str>) {
        self.plain.push(format!("{} {}", key, rendered));
        self.redacted
            .push(format!("{} {}", key, quote_literal(REDACTED)));
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            // The escaped form goes first so it is scrubbed whole.
            if text.contains('\'') {
                self.sensitive.push(text.replace('\'', "''"));
            }
            self.sensitive.push(text.to_string());
        }
    }
}

/// Compile `CREATE OR REPLACE ... SECRET` for `secret`.
pub fn compile_secret(secret: &SecretDefinition) -> CompileResult<Statement> {
    let label = format!("secret '{}'", secret.name);
    if secret.name.is_empty() {
        return Err(CompileError::new(
            label,
            "secret name must not be empty",
            CompileErrorCode::EmptyIdentifier,
        ));
    }

    let mut params = Params::default();
    params.raw("TYPE", secret.credentials.secret_type().as_str());

    match &secret.credentials {
        SecretCredentials::ObjectStore {
            provider,
            key_id,
            secret: secret_key,
            session_token,
            region,
            endpoint,
            url_style,
            use_ssl,
            account_id,
            ..
        } => {
            if *provider == SecretProvider::CredentialChain {
                params.raw("PROVIDER", provider.as_str());
            }
            params.secret("KEY_ID", key_id);
            params.secret("SECRET", secret_key);
            params.secret("SESSION_TOKEN", session_token);
            params.text("REGION", region);
            params.text("ENDPOINT", endpoint);
            params.text("URL_STYLE", url_style);
            if let Some(use_ssl) = use_ssl {
                params.raw("USE_SSL", use_ssl.to_string());
            }
            params.text("ACCOUNT_ID", account_id);
        }
        SecretCredentials::Azure {
            provider,
            connection_string,
            account_name,
            tenant_id,
            client_id,
            client_secret,
        } => {
            if *provider == SecretProvider::CredentialChain {
                params.raw("PROVIDER", provider.as_str());
            }
            params.secret("CONNECTION_STRING", connection_string);
            params.text("ACCOUNT_NAME", account_name);
            params.text("TENANT_ID", tenant_id);
            params.text("CLIENT_ID", client_id);
            params.secret("CLIENT_SECRET", client_secret);
        }
        SecretCredentials::Http { bearer_token } => {
            params.secret("BEARER_TOKEN", bearer_token);
        }
        SecretCredentials::Database {
            host,
            port,
            database,
            user,
            password,
            ..
        } => {
            params.raw("HOST", quote_literal(host));
            if let Some(port) = port {
                params.raw("PORT", port.to_string());
            }
            params.text("DATABASE", database);
            params.text("USER", user);
            params.secret("PASSWORD", password);
        }
    }

    params.text("SCOPE", &secret.scope);
    for (key, value) in secret.options.iter() {
        params.option(&label, key, value)?;
    }

    let head = format!(
        "CREATE OR REPLACE {} SECRET {}",
        if secret.persistent {
            "PERSISTENT"
        } else {
            "TEMPORARY"
        },
        quote_ident(&secret.name)
    );
    let sql = format!("{} ({})", head, params.plain.join(", "));
    let entity = Entity::new(EntityKind::Secret, secret.name.clone());

    if params.plain == params.redacted {
        Ok(Statement::new(entity, sql))
    } else {
        let redacted = format!("{} ({})", head, params.redacted.join(", "));
        Ok(Statement::sensitive(entity, sql, redacted, params.sensitive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duckalog_core::{OptionValue, SecretType};
    use pretty_assertions::assert_eq;

    fn s3(key: &str, secret: &str) -> SecretDefinition {
        SecretDefinition::new(
            "prod",
            SecretCredentials::ObjectStore {
                service: SecretType::S3,
                provider: SecretProvider::Config,
                key_id: Some(Secret::new(key)),
                secret: Some(Secret::new(secret)),
                session_token: None,
                region: Some("us-east-1".into()),
                endpoint: None,
                url_style: None,
                use_ssl: None,
                account_id: None,
            },
        )
    }

    #[test]
    fn test_s3_secret() {
        let stmt = compile_secret(&s3("AKIA", "shh").with_scope("s3://bucket/")).unwrap();
        assert_eq!(
            stmt.sql(),
            "CREATE OR REPLACE TEMPORARY SECRET \"prod\" (TYPE s3, KEY_ID 'AKIA', SECRET 'shh', REGION 'us-east-1', SCOPE 's3://bucket/')"
        );
        assert_eq!(
            stmt.redacted(),
            "CREATE OR REPLACE TEMPORARY SECRET \"prod\" (TYPE s3, KEY_ID '***', SECRET '***', REGION 'us-east-1', SCOPE 's3://bucket/')"
        );
    }

    #[test]
    fn test_persistent_secret() {
        let stmt = compile_secret(&s3("a", "b").persistent()).unwrap();
        assert!(stmt.sql().starts_with("CREATE OR REPLACE PERSISTENT SECRET"));
    }

    #[test]
    fn test_credential_chain() {
        let secret = SecretDefinition::new(
            "chain",
            SecretCredentials::ObjectStore {
                service: SecretType::Gcs,
                provider: SecretProvider::CredentialChain,
                key_id: None,
                secret: None,
                session_token: None,
                region: None,
                endpoint: None,
                url_style: None,
                use_ssl: Some(true),
                account_id: None,
            },
        );
        let stmt = compile_secret(&secret).unwrap();
        assert!(!stmt.is_sensitive());
        assert_eq!(
            stmt.sql(),
            "CREATE OR REPLACE TEMPORARY SECRET \"chain\" (TYPE gcs, PROVIDER credential_chain, USE_SSL true)"
        );
    }

    #[test]
    fn test_postgres_secret() {
        let secret = SecretDefinition::new(
            "pg",
            SecretCredentials::Database {
                engine: SecretType::Postgres,
                host: "db.internal".into(),
                port: Some(5432),
                database: Some("app".into()),
                user: Some("reader".into()),
                password: Some(Secret::new("p'w")),
            },
        );
        let stmt = compile_secret(&secret).unwrap();
        assert_eq!(
            stmt.sql(),
            "CREATE OR REPLACE TEMPORARY SECRET \"pg\" (TYPE postgres, HOST 'db.internal', PORT 5432, DATABASE 'app', USER 'reader', PASSWORD 'p''w')"
        );
        assert!(!stmt.redacted().contains("p''w"));
        assert_eq!(stmt.scrub("bad password p''w"), "bad password ***");
    }

    #[test]
    fn test_list_option_is_type_error() {
        let secret = s3("a", "b").with_option("regions", OptionValue::List(vec![]));
        let err = compile_secret(&secret).unwrap_err();
        assert_eq!(err.kind(), duckalog_core::ErrorKind::Type);
        assert!(err.to_string().contains("'regions'"));
        assert!(err.to_string().contains("list"));
    }

    #[test]
    fn test_extra_options() {
        let secret = s3("a", "b").with_option("refresh", "auto");
        let stmt = compile_secret(&secret).unwrap();
        assert!(stmt.sql().ends_with("REFRESH 'auto')"));
        assert!(stmt.redacted().ends_with("REFRESH '***')"));
    }

    #[test]
    fn test_option_values_are_redacted() {
        let secret = SecretDefinition::new(
            "api",
            SecretCredentials::Http { bearer_token: None },
        )
        .with_option("extra_http_headers_token", "tok'en-123")
        .with_option("retries", 3i64);
        let stmt = compile_secret(&secret).unwrap();

        assert!(stmt.is_sensitive());
        assert_eq!(
            stmt.sql(),
            "CREATE OR REPLACE TEMPORARY SECRET \"api\" (TYPE http, EXTRA_HTTP_HEADERS_TOKEN 'tok''en-123', RETRIES 3)"
        );
        assert_eq!(
            stmt.redacted(),
            "CREATE OR REPLACE TEMPORARY SECRET \"api\" (TYPE http, EXTRA_HTTP_HEADERS_TOKEN '***', RETRIES '***')"
        );
        assert_eq!(
            stmt.scrub("near 'tok''en-123' and tok'en-123"),
            "near '***' and ***"
        );
    }
}
