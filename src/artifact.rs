use std::{
    fs,
    path::{Path, PathBuf},
};

use log::trace;
use url::Url;

use crate::error::InputError;

/// Inputs for building an entry from a raw DSSE envelope.
///
/// The envelope and keys can each be given inline or as references to local files.
/// References that parse as URLs (`https://`, `file://`, ...) are refused.
#[derive(Debug, Clone, Default)]
pub struct ArtifactProperties {
    /// Envelope JSON bytes; takes precedence over `artifact_path`
    pub artifact_bytes: Option<Vec<u8>>,
    /// Reference to a local file holding the envelope JSON
    pub artifact_path: Option<String>,
    /// Inline candidate public keys
    pub public_keys_bytes: Vec<Vec<u8>>,
    /// References to local files holding candidate public keys
    pub public_keys_paths: Vec<String>,
}

/// Envelope and candidate key bytes collected from [`ArtifactProperties`].
#[derive(Debug, Clone)]
pub struct GatheredArtifact {
    pub envelope: Vec<u8>,
    pub public_keys: Vec<Vec<u8>>,
}

impl ArtifactProperties {
    /// Resolves every reference and reads the referenced files.
    ///
    /// All references are checked before any file is opened, so a remote reference
    /// fails without touching the filesystem.
    pub fn gather(&self) -> Result<GatheredArtifact, InputError> {
        let artifact_path = match (&self.artifact_bytes, &self.artifact_path) {
            (Some(_), _) => None,
            (None, Some(reference)) => Some(local_path(reference)?),
            (None, None) => return Err(InputError::MissingArtifact),
        };

        let key_paths = self
            .public_keys_paths
            .iter()
            .map(|reference| local_path(reference))
            .collect::<Result<Vec<_>, _>>()?;

        let envelope = match (&self.artifact_bytes, artifact_path) {
            (Some(bytes), _) => bytes.clone(),
            (None, Some(path)) => read_local(&path)?,
            (None, None) => return Err(InputError::MissingArtifact),
        };

        let mut public_keys = self.public_keys_bytes.clone();
        for path in &key_paths {
            public_keys.push(read_local(path)?);
        }

        Ok(GatheredArtifact {
            envelope,
            public_keys,
        })
    }
}

/// Accepts `reference` only if it names a local path.
///
/// Anything that parses as an absolute URL is remote. A reference that fails to parse
/// for any reason other than lacking a scheme is refused too.
pub fn local_path(reference: &str) -> Result<PathBuf, InputError> {
    match Url::parse(reference) {
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(PathBuf::from(reference)),
        _ => Err(InputError::RemoteReference(reference.to_owned())),
    }
}

fn read_local(path: &Path) -> Result<Vec<u8>, InputError> {
    trace!("reading {}", path.display());

    fs::read(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn local_and_remote_references() {
        for remote in [
            "https://example.com/envelope.json",
            "http://example.com",
            "file:///tmp/envelope.json",
            "s3+https://bucket/key",
            " https://example.com/e.json",
            "HTTPS://EXAMPLE.COM/e.json",
        ] {
            assert!(
                matches!(local_path(remote), Err(InputError::RemoteReference(_))),
                "{remote} should be remote"
            );
        }

        for local in ["envelope.json", "./keys/a.pem", "/tmp/keys/a.pem", "dir/with:colon"] {
            assert_eq!(local_path(local).unwrap(), PathBuf::from(local));
        }
    }

    #[test]
    fn padded_url_never_reaches_the_filesystem() {
        let props = ArtifactProperties {
            artifact_path: Some(" https://example.com/e.json".to_owned()),
            ..Default::default()
        };

        assert!(matches!(props.gather(), Err(InputError::RemoteReference(_))));
    }

    #[test]
    fn remote_artifact_is_rejected() {
        let props = ArtifactProperties {
            artifact_path: Some("https://example.com/envelope.json".to_owned()),
            ..Default::default()
        };

        assert!(matches!(
            props.gather(),
            Err(InputError::RemoteReference(r)) if r == "https://example.com/envelope.json"
        ));
    }

    #[test]
    fn remote_key_is_rejected_before_reading_anything() {
        // The artifact path does not exist: a read attempt would yield Unreadable.
        let props = ArtifactProperties {
            artifact_path: Some("does/not/exist.json".to_owned()),
            public_keys_paths: vec!["https://example.com/key.pem".to_owned()],
            ..Default::default()
        };

        assert!(matches!(props.gather(), Err(InputError::RemoteReference(_))));
    }

    #[test]
    fn missing_artifact() {
        assert!(matches!(
            ArtifactProperties::default().gather(),
            Err(InputError::MissingArtifact)
        ));
    }

    #[test]
    fn unreadable_file() {
        let props = ArtifactProperties {
            artifact_path: Some("does/not/exist.json".to_owned()),
            ..Default::default()
        };

        assert!(matches!(props.gather(), Err(InputError::Unreadable { .. })));
    }

    #[test]
    fn reads_local_files_and_keeps_inline_keys_first() {
        let dir = tempfile::tempdir().unwrap();

        let envelope_path = dir.path().join("envelope.json");
        fs::File::create(&envelope_path)
            .unwrap()
            .write_all(b"{}")
            .unwrap();

        let key_path = dir.path().join("key.pem");
        fs::write(&key_path, b"file key").unwrap();

        let props = ArtifactProperties {
            artifact_bytes: None,
            artifact_path: Some(envelope_path.to_string_lossy().into_owned()),
            public_keys_bytes: vec![b"inline key".to_vec()],
            public_keys_paths: vec![key_path.to_string_lossy().into_owned()],
        };

        let gathered = props.gather().unwrap();
        assert_eq!(gathered.envelope, b"{}");
        assert_eq!(
            gathered.public_keys,
            vec![b"inline key".to_vec(), b"file key".to_vec()]
        );
    }
}
