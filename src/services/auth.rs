use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::db::with_deadline;
use crate::entities::{usuario, Usuario};
use crate::errors::ServiceError;

/// A single operator account that authenticates without touching storage.
/// Comes from configuration so the special case stays isolated here instead
/// of scattered through control flow.
#[derive(Debug, Clone)]
struct BootstrapCredential {
    usuario: String,
    contrasena: String,
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Successful login result
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub usuario: String,
    pub token: String,
}

/// Credential check against the bootstrap account or the `usuarios` table.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    bootstrap: Option<BootstrapCredential>,
    encoding_key: EncodingKey,
    token_ttl: Duration,
    op_timeout: Duration,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, cfg: &AppConfig) -> Self {
        let bootstrap = match (&cfg.auth_bootstrap_usuario, &cfg.auth_bootstrap_contrasena) {
            (Some(usuario), Some(contrasena)) => Some(BootstrapCredential {
                usuario: usuario.clone(),
                contrasena: contrasena.clone(),
            }),
            _ => None,
        };
        Self {
            db,
            bootstrap,
            encoding_key: EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
            token_ttl: Duration::from_secs(cfg.session_token_expiration_secs),
            op_timeout: Duration::from_secs(cfg.db_operation_timeout_secs),
        }
    }

    /// Validates a credential pair and issues a short-lived session token.
    ///
    /// The bootstrap account short-circuits before any storage access. For
    /// database users the presented password is verified against the stored
    /// Argon2 hash; a user row without a hash is a server-side mistake and
    /// surfaces as an internal error, not a credential failure.
    #[instrument(skip(self, contrasena))]
    pub async fn login(
        &self,
        usuario: &str,
        contrasena: &str,
    ) -> Result<LoginOutcome, ServiceError> {
        if let Some(bootstrap) = &self.bootstrap {
            if bootstrap.usuario == usuario && bootstrap.contrasena == contrasena {
                info!(usuario, "Bootstrap login");
                return Ok(LoginOutcome {
                    usuario: usuario.to_string(),
                    token: self.issue_token(usuario)?,
                });
            }
        }

        let db = self.db.clone();
        let nombre = usuario.to_string();
        let registro = with_deadline("login", self.op_timeout, async move {
            Usuario::find()
                .filter(usuario::Column::Usuario.eq(nombre))
                .one(&*db)
                .await
                .map_err(ServiceError::DatabaseError)
        })
        .await?;

        let registro = registro.ok_or(ServiceError::AuthError)?;
        let hash = registro.contrasena_hash.as_deref().ok_or_else(|| {
            error!(usuario, "User exists but carries no password hash");
            ServiceError::InternalError("contraseña no configurada".to_string())
        })?;

        verify_password(contrasena, hash)?;

        info!(usuario, "Login successful");
        Ok(LoginOutcome {
            usuario: registro.usuario,
            token: self.issue_token(usuario)?,
        })
    }

    fn issue_token(&self, usuario: &str) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: usuario.to_string(),
            iat: now,
            exp: now + self.token_ttl.as_secs() as i64,
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to sign session token");
            ServiceError::InternalError("no se pudo emitir el token".to_string())
        })
    }
}

/// Hashes a password with Argon2 and a fresh random salt.
pub fn hash_password(contrasena: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(contrasena.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            ServiceError::InternalError("error al procesar la contraseña".to_string())
        })
}

/// Verifies a password against a stored Argon2 hash.
fn verify_password(contrasena: &str, hash: &str) -> Result<(), ServiceError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "Stored password hash is malformed");
        ServiceError::InternalError("hash de contraseña inválido".to_string())
    })?;

    Argon2::default()
        .verify_password(contrasena.as_bytes(), &parsed)
        .map_err(|e| {
            if matches!(e, argon2::password_hash::Error::Password) {
                warn!("Password mismatch");
                ServiceError::AuthError
            } else {
                error!(error = %e, "Password verification failed");
                ServiceError::InternalError("error al verificar la contraseña".to_string())
            }
        })
}
