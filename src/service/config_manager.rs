// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration manager.
//!
//! The `ConfigManager` owns every [`ConfigDomain`], provides typed access with
//! value coercion, notifies listeners of property changes, and loads domains
//! from a property directory on first use.

use super::ConfigDomain;
use crate::adapters::{DefaultValueMapper, PropertiesDirectory};
use crate::domain::{DomainName, DomainSnapshot, ModuleError, ModuleType, Result, Value};
use crate::ports::{ChangeCallback, PropertyChange, PropertySource, ValueMapper};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Owner of all configuration domains.
///
/// Domains are created on first write, or loaded from the configured
/// [`PropertiesDirectory`] on first read. Explicitly creating a domain that
/// already exists is an error.
///
/// # Examples
///
/// ```rust
/// use modwire::service::ConfigManager;
///
/// # fn main() -> modwire::domain::Result<()> {
/// let config = ConfigManager::new();
/// config.set("app", "port", "8080")?;
///
/// let port: Option<u16> = config.get_as("app", "port")?;
/// assert_eq!(port, Some(8080));
/// # Ok(())
/// # }
/// ```
pub struct ConfigManager {
    domains: DashMap<DomainName, Arc<ConfigDomain>>,
    /// Domains with no property file, so the directory is not searched again
    missing: DashSet<DomainName>,
    directory: Option<PropertiesDirectory>,
    mapper: Arc<dyn ValueMapper>,
    listeners: RwLock<Vec<ChangeCallback>>,
}

impl ConfigManager {
    /// Creates an in-memory manager with the default value mapper.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new configuration manager builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modwire::service::ConfigManager;
    ///
    /// let config = ConfigManager::builder()
    ///     .with_directory("/etc/myapp")
    ///     .build();
    /// assert!(config.directory().is_some());
    /// ```
    pub fn builder() -> ConfigManagerBuilder {
        ConfigManagerBuilder::new()
    }

    /// Explicitly creates an empty domain.
    ///
    /// Fails with [`ModuleError::DuplicateDomain`] if the domain exists.
    pub fn create_domain(&self, name: impl Into<DomainName>) -> Result<Arc<ConfigDomain>> {
        let name = name.into();
        match self.domains.entry(name.clone()) {
            Entry::Occupied(_) => Err(ModuleError::DuplicateDomain {
                domain: name.into_string(),
            }),
            Entry::Vacant(slot) => {
                let domain = Arc::new(ConfigDomain::new(name.clone()));
                slot.insert(Arc::clone(&domain));
                self.missing.remove(&name);
                debug!("Created domain '{}'", name);
                Ok(domain)
            }
        }
    }

    /// Returns a domain, loading it from the property directory if needed.
    ///
    /// A property file that exists but cannot be read or parsed is an error;
    /// it is retried on the next lookup.
    pub fn domain(&self, name: &DomainName) -> Result<Option<Arc<ConfigDomain>>> {
        if let Some(domain) = self.domains.get(name) {
            return Ok(Some(Arc::clone(domain.value())));
        }
        let Some(directory) = self.directory.as_ref() else {
            return Ok(None);
        };
        if self.missing.contains(name) {
            return Ok(None);
        }
        match directory.load(name) {
            Ok(Some(props)) => {
                let loaded = Arc::new(ConfigDomain::from_strings(name.clone(), props));
                let domain = self
                    .domains
                    .entry(name.clone())
                    .or_insert(loaded)
                    .value()
                    .clone();
                debug!("Loaded domain '{}' ({} properties)", name, domain.len());
                Ok(Some(domain))
            }
            Ok(None) => {
                self.missing.insert(name.clone());
                Ok(None)
            }
            Err(e) => {
                warn!("Failed to load domain '{}': {}", name, e);
                Err(e)
            }
        }
    }

    fn domain_or_create(&self, name: &DomainName) -> Result<Arc<ConfigDomain>> {
        if let Some(domain) = self.domain(name)? {
            return Ok(domain);
        }
        let created = self
            .domains
            .entry(name.clone())
            .or_insert_with(|| Arc::new(ConfigDomain::new(name.clone())))
            .value()
            .clone();
        Ok(created)
    }

    /// Reads a domain's property file, replacing the domain's in-memory values
    /// with the file's values. Listeners are notified of each change.
    ///
    /// Fails with [`ModuleError::PropertyFileNotFound`] if the directory holds
    /// no file for the domain.
    pub fn load_domain(&self, name: impl Into<DomainName>) -> Result<Arc<ConfigDomain>> {
        let name = name.into();
        let directory = self
            .directory
            .as_ref()
            .ok_or_else(|| ModuleError::SourceError {
                source_name: "config-manager".to_string(),
                message: "No property directory configured".to_string(),
                source: None,
            })?;
        let props = directory
            .load(&name)?
            .ok_or_else(|| ModuleError::PropertyFileNotFound {
                domain: name.as_str().to_string(),
                directory: directory.root().display().to_string(),
            })?;

        self.missing.remove(&name);
        let domain = self
            .domains
            .entry(name.clone())
            .or_insert_with(|| Arc::new(ConfigDomain::new(name.clone())))
            .value()
            .clone();
        for stale in domain.names() {
            if !props.contains_key(&stale) {
                let old = domain.set(stale.as_str(), None);
                self.notify(&name, &stale, old, None);
            }
        }
        for (key, text) in props {
            let new = Value::from(text);
            let old = domain.set(key.as_str(), Some(new.clone()));
            self.notify(&name, &key, old, Some(new));
        }
        Ok(domain)
    }

    /// Looks up a property without coercion.
    pub fn get(&self, domain: impl Into<DomainName>, name: &str) -> Result<Option<Value>> {
        Ok(self.domain(&domain.into())?.and_then(|d| d.get(name)))
    }

    /// Looks up a property and coerces it to `target`.
    ///
    /// Fails with [`ModuleError::NoConversion`] if the stored value has another
    /// type and the value mapper cannot convert it.
    pub fn get_typed(
        &self,
        domain: impl Into<DomainName>,
        name: &str,
        target: &ModuleType,
    ) -> Result<Option<Value>> {
        let domain = domain.into();
        let Some(value) = self.get(domain.clone(), name)? else {
            return Ok(None);
        };
        if value.is_type(target) {
            return Ok(Some(value));
        }
        let key = format!("{}.{}", domain, name);
        match self.mapper.map(&key, &value, target)? {
            Some(mapped) => Ok(Some(mapped)),
            None => Err(ModuleError::NoConversion {
                key,
                from: value.type_info().name().to_string(),
                to: target.name().to_string(),
            }),
        }
    }

    /// Looks up a property as a `T`, coercing it if needed.
    pub fn get_as<T: Any + Clone>(
        &self,
        domain: impl Into<DomainName>,
        name: &str,
    ) -> Result<Option<T>> {
        let target = ModuleType::of::<T>();
        match self.get_typed(domain, name, &target)? {
            None => Ok(None),
            Some(value) => value.get::<T>().map(Some).ok_or_else(|| ModuleError::TypeMismatch {
                expected: target.name().to_string(),
                actual: value.type_info().name().to_string(),
            }),
        }
    }

    /// Stores a property, creating the domain if needed. Returns the previous value.
    pub fn set(
        &self,
        domain: impl Into<DomainName>,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        self.set_value(&domain.into(), name, Some(value.into()))
    }

    /// Removes a property, returning its value.
    pub fn remove(&self, domain: impl Into<DomainName>, name: &str) -> Result<Option<Value>> {
        self.set_value(&domain.into(), name, None)
    }

    /// Stores or removes a property and notifies listeners of real changes.
    pub fn set_value(
        &self,
        domain: &DomainName,
        name: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>> {
        let target = match &value {
            Some(_) => self.domain_or_create(domain)?,
            None => match self.domain(domain)? {
                Some(d) => d,
                None => return Ok(None),
            },
        };
        let old = target.set(name, value.clone());
        self.notify(domain, name, old.clone(), value);
        Ok(old)
    }

    fn notify(&self, domain: &DomainName, name: &str, old: Option<Value>, new: Option<Value>) {
        let change = PropertyChange {
            domain: domain.clone(),
            name: name.to_string(),
            old,
            new,
        };
        if !change.is_change() {
            return;
        }
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(_) => {
                warn!("Listener list poisoned; skipping change notification");
                return;
            }
        };
        for listener in listeners {
            listener(&change);
        }
    }

    /// Registers a change listener.
    ///
    /// Listeners run on the writing thread for every transition whose old and
    /// new values differ.
    pub fn subscribe(&self, callback: ChangeCallback) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push(callback);
        }
    }

    /// Names of the domains currently in memory, sorted.
    pub fn domain_names(&self) -> Vec<DomainName> {
        let mut names: Vec<DomainName> = self.domains.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Exports every textual property currently in memory.
    pub fn snapshot(&self) -> DomainSnapshot {
        let mut snapshot = DomainSnapshot::default();
        for entry in self.domains.iter() {
            for (name, value) in entry.value().entries() {
                if let Some(text) = value.as_text() {
                    snapshot.insert(entry.key().clone(), name, text);
                }
            }
        }
        snapshot
    }

    /// The value mapper used for coercion.
    pub fn mapper(&self) -> &Arc<dyn ValueMapper> {
        &self.mapper
    }

    /// The property directory, if one is configured.
    pub fn directory(&self) -> Option<&PropertiesDirectory> {
        self.directory.as_ref()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigManager")
            .field("domains", &self.domain_names())
            .field("directory", &self.directory)
            .finish()
    }
}

impl PropertySource for ConfigManager {
    fn name(&self) -> &str {
        "config-manager"
    }

    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        Ok(self.domain(domain)?.and_then(|d| d.get(name)))
    }

    fn set_property(
        &self,
        domain: &DomainName,
        name: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>> {
        self.set_value(domain, name, value)
    }

    fn domains(&self) -> Vec<DomainName> {
        self.domain_names()
    }
}

/// Builder for constructing a [`ConfigManager`].
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::DefaultValueMapper;
/// use modwire::service::ConfigManager;
/// use std::net::IpAddr;
/// use std::sync::Arc;
///
/// let config = ConfigManager::builder()
///     .with_value_mapper(Arc::new(DefaultValueMapper::new().with_parser::<IpAddr>()))
///     .build();
/// config.set("net", "bind", "127.0.0.1").unwrap();
/// let ip: Option<IpAddr> = config.get_as("net", "bind").unwrap();
/// assert!(ip.unwrap().is_loopback());
/// ```
pub struct ConfigManagerBuilder {
    directory: Option<PropertiesDirectory>,
    mapper: Option<Arc<dyn ValueMapper>>,
    listeners: Vec<ChangeCallback>,
}

impl ConfigManagerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            directory: None,
            mapper: None,
            listeners: Vec::new(),
        }
    }

    /// Loads domains lazily from property files in `path`.
    pub fn with_directory<P: AsRef<Path>>(self, path: P) -> Self {
        self.with_properties_directory(PropertiesDirectory::new(path))
    }

    /// Loads domains lazily from the given directory adapter.
    pub fn with_properties_directory(mut self, directory: PropertiesDirectory) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Loads domains lazily from the OS-appropriate configuration directory.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use modwire::service::ConfigManager;
    ///
    /// # fn main() -> modwire::domain::Result<()> {
    /// let config = ConfigManager::builder()
    ///     .with_default_location("myapp", "com.example")?
    ///     .build();
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "files")]
    pub fn with_default_location(self, app_name: &str, qualifier: &str) -> Result<Self> {
        let directory = PropertiesDirectory::from_default_location(app_name, qualifier)?;
        Ok(self.with_properties_directory(directory))
    }

    /// Uses a custom value mapper for coercion.
    pub fn with_value_mapper(mut self, mapper: Arc<dyn ValueMapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Registers a change listener.
    pub fn with_listener(mut self, callback: ChangeCallback) -> Self {
        self.listeners.push(callback);
        self
    }

    /// Builds the manager.
    pub fn build(self) -> ConfigManager {
        ConfigManager {
            domains: DashMap::new(),
            missing: DashSet::new(),
            directory: self.directory,
            mapper: self
                .mapper
                .unwrap_or_else(|| Arc::new(DefaultValueMapper::new())),
            listeners: RwLock::new(self.listeners),
        }
    }
}

impl Default for ConfigManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
