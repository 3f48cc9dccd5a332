//! certbot/openssl wrapper
//!
//! Wraps the external `openssl` and `certbot` tools to issue a certificate
//! for a custom domain via the dns-multi DNS challenge plugin. The tools
//! stay external: this crate only assembles their invocations and collects
//! the resulting PEM blobs.

pub mod error;

pub use error::{CertbotError, Result};

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const PRIVATE_KEY_FILE: &str = "private-key.pem";
const CSR_FILE: &str = "csr.pem";
const CERT_FILE: &str = "cert.pem";
const FULLCHAIN_FILE: &str = "fullchain.pem";
const DNS_CREDENTIALS_FILE: &str = "dns-multi.ini";

/// Inputs for one certificate issuance.
#[derive(Debug, Clone)]
pub struct CertbotConfig {
    pub domain: String,
    /// dns-multi provider plugin name, e.g. "digitalocean".
    pub dns_provider: String,
    /// Contact email for the ACME account.
    pub email: String,
    /// Directory all generated material is confined to.
    pub work_dir: PathBuf,
}

/// A certificate chain and its private key as PEM text.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub chain: String,
    pub key: String,
}

/// Issue a certificate for the configured domain.
///
/// Generates an RSA key and CSR with `openssl`, writes the dns-multi
/// credentials file, then runs `certbot certonly` non-interactively. On
/// success the fullchain and private key are read back from the work
/// directory.
pub async fn issue_certificate(config: &CertbotConfig) -> Result<Certificate> {
    tokio::fs::create_dir_all(&config.work_dir).await?;

    let key_path = config.work_dir.join(PRIVATE_KEY_FILE);
    let csr_path = config.work_dir.join(CSR_FILE);

    generate_private_key(&key_path).await?;
    generate_csr(&key_path, &csr_path, &config.domain).await?;
    write_dns_credentials(config).await?;

    let args = certbot_args(config);
    run_tool("certbot", &args).await?;

    let certificate = load_certificate(&config.work_dir).await?;
    tracing::info!(domain = %config.domain, "certificate issued");
    Ok(certificate)
}

/// Read back a previously issued certificate from a work directory.
pub async fn load_certificate(work_dir: &Path) -> Result<Certificate> {
    let chain = tokio::fs::read_to_string(work_dir.join(FULLCHAIN_FILE)).await?;
    let key = tokio::fs::read_to_string(work_dir.join(PRIVATE_KEY_FILE)).await?;
    Ok(Certificate { chain, key })
}

async fn generate_private_key(key_path: &Path) -> Result<()> {
    run_tool(
        "openssl",
        &[
            "genpkey".to_string(),
            "-algorithm".to_string(),
            "RSA".to_string(),
            "-out".to_string(),
            key_path.display().to_string(),
        ],
    )
    .await
}

async fn generate_csr(key_path: &Path, csr_path: &Path, domain: &str) -> Result<()> {
    run_tool(
        "openssl",
        &[
            "req".to_string(),
            "-new".to_string(),
            "-key".to_string(),
            key_path.display().to_string(),
            "-out".to_string(),
            csr_path.display().to_string(),
            "-subj".to_string(),
            format!("/CN={domain}"),
        ],
    )
    .await
}

/// Writes the dns-multi credentials file. certbot refuses credentials with
/// open permissions, so the mode is clamped to 0600.
async fn write_dns_credentials(config: &CertbotConfig) -> Result<()> {
    let path = config.work_dir.join(DNS_CREDENTIALS_FILE);
    let contents = format!("dns_multi_provider = {}\n", config.dns_provider);
    tokio::fs::write(&path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&path, permissions).await?;
    }

    Ok(())
}

fn certbot_args(config: &CertbotConfig) -> Vec<String> {
    let dir = |file: &str| config.work_dir.join(file).display().to_string();
    vec![
        "certonly".to_string(),
        "-a".to_string(),
        "dns-multi".to_string(),
        "--dns-multi-credentials".to_string(),
        dir(DNS_CREDENTIALS_FILE),
        "--csr".to_string(),
        dir(CSR_FILE),
        "--cert-path".to_string(),
        dir(CERT_FILE),
        "--fullchain-path".to_string(),
        dir(FULLCHAIN_FILE),
        "-d".to_string(),
        config.domain.clone(),
        "--non-interactive".to_string(),
        "--agree-tos".to_string(),
        "-m".to_string(),
        config.email.clone(),
        "--config-dir".to_string(),
        config.work_dir.display().to_string(),
        "--work-dir".to_string(),
        config.work_dir.display().to_string(),
        "--logs-dir".to_string(),
        config.work_dir.display().to_string(),
    ]
}

/// Run an external tool, capturing output. A missing binary is reported
/// separately from a failing one.
async fn run_tool(program: &str, args: &[String]) -> Result<()> {
    tracing::debug!("Running: {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CertbotError::ToolNotFound(program.to_string())
            } else {
                CertbotError::Io(err)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CertbotError::CommandFailed {
            tool: program.to_string(),
            stderr: stderr.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CertbotConfig {
        CertbotConfig {
            domain: "app.example.com".to_string(),
            dns_provider: "digitalocean".to_string(),
            email: "ops@example.com".to_string(),
            work_dir: PathBuf::from("certbot-output"),
        }
    }

    #[test]
    fn certbot_args_cover_the_dns_challenge() {
        let args = certbot_args(&test_config());

        assert_eq!(args[0], "certonly");
        let joined = args.join(" ");
        assert!(joined.contains("-a dns-multi"));
        assert!(joined.contains("-d app.example.com"));
        assert!(joined.contains("-m ops@example.com"));
        assert!(joined.contains("--non-interactive"));
        assert!(joined.contains("--agree-tos"));
        assert!(joined.contains("--csr certbot-output/csr.pem"));
        assert!(joined.contains("--config-dir certbot-output"));
    }

    #[tokio::test]
    async fn dns_credentials_file_is_private() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.work_dir = dir.path().to_path_buf();

        write_dns_credentials(&config).await.unwrap();

        let path = config.work_dir.join(DNS_CREDENTIALS_FILE);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "dns_multi_provider = digitalocean\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
