//! Outcome types for existence checks and provisioning.
//!
//! Existence reads return a [`Lookup`] inside the usual result, so "absent" is a value the
//! caller matches on and every `Err` is a genuine failure.

/// Result of reading a resource by id.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The resource exists.
    Found(T),
    /// The store answered and the resource does not exist.
    Absent,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Absent => Lookup::Absent,
        }
    }

    /// Like [`Lookup::map`] for fallible conversions.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Lookup<U>, E> {
        match self {
            Lookup::Found(value) => f(value).map(Lookup::Found),
            Lookup::Absent => Ok(Lookup::Absent),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::Absent,
        }
    }
}

/// Outcome of an ensure-exists operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned<T> {
    /// The resource already existed and was left untouched.
    Found(T),
    /// The resource was absent and has been created.
    Created(T),
}

impl<T> Provisioned<T> {
    pub fn status(&self) -> ProvisionStatus {
        match self {
            Provisioned::Found(_) => ProvisionStatus::Found,
            Provisioned::Created(_) => ProvisionStatus::Created,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Provisioned::Created(_))
    }

    pub fn resource(&self) -> &T {
        match self {
            Provisioned::Found(value) | Provisioned::Created(value) => value,
        }
    }

    pub fn into_resource(self) -> T {
        match self {
            Provisioned::Found(value) | Provisioned::Created(value) => value,
        }
    }
}

/// Data-free view of [`Provisioned`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStatus {
    Found,
    Created,
}

impl std::fmt::Display for ProvisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProvisionStatus::Found => "Found",
            ProvisionStatus::Created => "Created",
        })
    }
}
