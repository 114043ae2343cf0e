#![forbid(unsafe_code)]

//! Credential stores.

use crate::key::Credential;
use crate::loader::{load_pem_bundle, load_pkcs12};
use crate::x509;
use solna_core::Error;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use zeroize::Zeroizing;

/// Something that can produce the signing/TLS credential.
///
/// HSMs and secret managers plug in here next to the file stores.
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Result<Credential, Error>;
}

/// Reads a PEM bundle (key plus certificates) from disk.
pub struct PemBundleStore {
    path: PathBuf,
    password: Option<Zeroizing<String>>,
}

impl PemBundleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            password: None,
        }
    }

    /// Password used to decrypt an `ENCRYPTED PRIVATE KEY` block.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for PemBundleStore {
    fn load(&self) -> Result<Credential, Error> {
        let data = read(&self.path)?;
        let credential = load_pem_bundle(&data, self.password.as_deref().map(String::as_str))?;
        log_loaded(&self.path, &credential)?;
        Ok(credential)
    }
}

/// Reads a password-protected PKCS#12 (.p12/.pfx) container from disk.
pub struct Pkcs12Store {
    path: PathBuf,
    password: Zeroizing<String>,
}

impl Pkcs12Store {
    /// A store for a container with an empty password.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            password: Zeroizing::new(String::new()),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Zeroizing::new(password.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for Pkcs12Store {
    fn load(&self) -> Result<Credential, Error> {
        let data = read(&self.path)?;
        let credential = load_pkcs12(&data, &self.password)?;
        log_loaded(&self.path, &credential)?;
        Ok(credential)
    }
}

impl std::fmt::Debug for Pkcs12Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pkcs12Store")
            .field("path", &self.path)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Open the store matching a credential file.
///
/// `.p12` and `.pfx` files are PKCS#12, `.pem`, `.crt` and `.key` files are
/// PEM bundles.  Any other name is decided by sniffing the file contents.
pub fn open(path: impl Into<PathBuf>, password: Option<&str>) -> Result<Box<dyn CredentialStore>, Error> {
    let path = path.into();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let pkcs12 = match extension.as_deref() {
        Some("p12" | "pfx") => true,
        Some("pem" | "crt" | "key") => false,
        _ => solna_pkcs12::looks_like_pkcs12(&read(&path)?),
    };

    if pkcs12 {
        let store = Pkcs12Store::new(path);
        Ok(Box::new(match password {
            Some(password) => store.with_password(password),
            None => store,
        }))
    } else {
        let store = PemBundleStore::new(path);
        Ok(Box::new(match password {
            Some(password) => store.with_password(password),
            None => store,
        }))
    }
}

fn read(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| Error::Credential(format!("cannot read {}: {e}", path.display())))
}

fn log_loaded(path: &Path, credential: &Credential) -> Result<(), Error> {
    let leaf = x509::summarize(credential.leaf_certificate()?)?;
    if leaf.is_valid_at(SystemTime::now()) {
        tracing::info!(
            path = %path.display(),
            subject = %leaf.subject,
            certificates = credential.chain().len(),
            "credential loaded"
        );
    } else {
        tracing::warn!(
            path = %path.display(),
            subject = %leaf.subject,
            "signing certificate is outside its validity period"
        );
    }
    Ok(())
}

impl std::fmt::Debug for PemBundleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PemBundleStore")
            .field("path", &self.path)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
