use std::collections::BTreeMap;

use log::trace;

use crate::{
    artifact::ArtifactProperties,
    config::Config,
    entry::{DsseV001Entry, EntryImpl},
    error::{Error, SchemaError},
    models::ProposedEntry,
    record::API_VERSION,
};

/// Ingests a proposal of one schema version.
pub type UnmarshalFn = fn(&ProposedEntry, &Config) -> Result<Box<dyn EntryImpl>, Error>;

/// Builds a proposal of one schema version from raw artifacts.
pub type CreateFn = fn(&ArtifactProperties) -> Result<ProposedEntry, Error>;

/// Constructors for one schema version.
#[derive(Debug, Clone, Copy)]
pub struct EntryFactory {
    pub unmarshal: UnmarshalFn,
    pub create_from_artifact: CreateFn,
}

/// Schema versions of the `dsse` kind known to the log.
#[derive(Debug, Clone, Default)]
pub struct EntryRegistry {
    versions: BTreeMap<String, EntryFactory>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in version.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.versions.insert(
            API_VERSION.to_owned(),
            EntryFactory {
                unmarshal: unmarshal_v001,
                create_from_artifact: DsseV001Entry::create_from_artifact_properties,
            },
        );
        registry
    }

    /// Adds a version. A version can only be registered once.
    pub fn register(
        &mut self,
        version: impl Into<String>,
        factory: EntryFactory,
    ) -> Result<(), Error> {
        let version = version.into();
        if self.versions.contains_key(&version) {
            return Err(SchemaError::DuplicateVersion(version).into());
        }

        trace!("registering dsse entry version {version}");
        self.versions.insert(version, factory);
        Ok(())
    }

    pub fn get(&self, version: &str) -> Option<&EntryFactory> {
        self.versions.get(version)
    }

    /// Registered versions, in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    /// Ingests `proposed` with the constructor for its `apiVersion`.
    pub fn unmarshal(
        &self,
        proposed: &ProposedEntry,
        config: &Config,
    ) -> Result<Box<dyn EntryImpl>, Error> {
        let factory = self.factory(&proposed.api_version)?;
        (factory.unmarshal)(proposed, config)
    }

    /// Builds a proposal of `version` from raw artifacts.
    pub fn create_from_artifact(
        &self,
        version: &str,
        props: &ArtifactProperties,
    ) -> Result<ProposedEntry, Error> {
        let factory = self.factory(version)?;
        (factory.create_from_artifact)(props)
    }

    fn factory(&self, version: &str) -> Result<&EntryFactory, Error> {
        self.get(version)
            .ok_or_else(|| SchemaError::UnsupportedVersion(version.to_owned()).into())
    }
}

fn unmarshal_v001(proposed: &ProposedEntry, config: &Config) -> Result<Box<dyn EntryImpl>, Error> {
    Ok(Box::new(DsseV001Entry::unmarshal(proposed, config)?))
}
