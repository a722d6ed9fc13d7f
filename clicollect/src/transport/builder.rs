//! Builder for SSH connection settings.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use super::ssh::SshTransport;
use crate::error::{ConfigError, Result};

/// Builder for [`SshConfig`] and [`SshTransport`].
///
/// # Example
///
/// ```rust,no_run
/// use clicollect::transport::ConnectBuilder;
///
/// # async fn example() -> Result<(), clicollect::Error> {
/// let transport = ConnectBuilder::new("192.168.1.99")
///     .username("admin")
///     .password("secret")
///     .connect()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConnectBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: Option<AuthMethod>,
    timeout: Duration,
    keepalive_interval: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl ConnectBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: None,
            timeout: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(30),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password(SecretString::from(password.into())));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        });
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        });
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the SSH keepalive interval.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Set terminal dimensions.
    ///
    /// The height is what makes the device paginate; the wide default keeps
    /// long lines from wrapping.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Validate the settings and produce an [`SshConfig`].
    pub fn build(self) -> Result<SshConfig> {
        let username = self.username.ok_or_else(|| invalid("username is required"))?;
        let auth = self
            .auth
            .ok_or_else(|| invalid("a password or private key is required"))?;
        if self.host.is_empty() {
            return Err(invalid("host is required").into());
        }

        Ok(SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth,
            timeout: self.timeout,
            keepalive_interval: self.keepalive_interval,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        })
    }

    /// Build the configuration, connect and open the interactive shell.
    pub async fn connect(self) -> Result<SshTransport> {
        SshTransport::connect(self.build()?).await
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfig {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::Error;

    #[test]
    fn test_build_with_password() {
        let config = ConnectBuilder::new("192.168.1.99")
            .port(2222)
            .username("admin")
            .password("secret")
            .build()
            .unwrap();
        assert_eq!(config.socket_addr(), "192.168.1.99:2222");
        assert_eq!(config.target(), "192.168.1.99 as admin");
        assert_eq!(config.host_key_verification, HostKeyVerification::AcceptNew);
        match &config.auth {
            AuthMethod::Password(p) => assert_eq!(p.expose_secret(), "secret"),
            other => panic!("unexpected auth {other:?}"),
        }
    }

    #[test]
    fn test_build_with_key_and_session_settings() {
        let config = ConnectBuilder::new("fw")
            .username("admin")
            .private_key_with_passphrase("/home/admin/.ssh/id_ed25519", "open sesame")
            .keepalive_interval(Duration::from_secs(5))
            .terminal_size(200, 40)
            .known_hosts_path("/tmp/known_hosts")
            .host_key_verification(HostKeyVerification::Strict)
            .build()
            .unwrap();
        assert_eq!(config.port, 22);
        assert_eq!(config.keepalive_interval, Duration::from_secs(5));
        assert_eq!((config.terminal_width, config.terminal_height), (200, 40));
        assert_eq!(config.known_hosts_path, Some(PathBuf::from("/tmp/known_hosts")));
        match &config.auth {
            AuthMethod::PrivateKey { path, passphrase } => {
                assert_eq!(path, &PathBuf::from("/home/admin/.ssh/id_ed25519"));
                assert_eq!(passphrase.as_ref().map(|p| p.expose_secret()), Some("open sesame"));
            }
            other => panic!("unexpected auth {other:?}"),
        }
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config = ConnectBuilder::new("fw")
            .username("admin")
            .password("hunter2")
            .build()
            .unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_username_required() {
        let err = ConnectBuilder::new("fw").password("x").build().unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn test_auth_required() {
        let err = ConnectBuilder::new("fw").username("admin").build().unwrap_err();
        assert!(err.to_string().contains("password or private key"));
    }
}
