//! Unit identities: assemblies, modules and the union of both.
//!
//! Every compiled unit is identified by a value type keyed on
//! `(name, version, culture, public-key-token)`. Identities compare and hash
//! structurally over exactly these four components; the location a unit was
//! loaded from is carried along for diagnostics but never participates in
//! equality.
//!
//! # Key Components
//!
//! - [`AssemblyIdentity`] - Name, four-part version, culture and public key token of an assembly
//! - [`AssemblyVersion`] - Four-part version numbering (major.minor.build.revision)
//! - [`ModuleIdentity`] - A module keyed by its name and the identity of its containing assembly
//! - [`UnitIdentity`] - Closed union of module and assembly identities
//!
//! # Permissive Construction
//!
//! Missing or empty identity components default to empty values instead of failing:
//! an empty culture means culture-neutral, an empty token means not strong-named and
//! an all-zero version means unknown. Display names are parsed the same way, only
//! syntactically broken values (non-hex tokens, non-numeric version parts) are rejected.
//!
//! # Examples
//!
//! ```rust
//! use dotmutate::metadata::identity::{AssemblyIdentity, AssemblyVersion};
//!
//! let mscorlib = AssemblyIdentity::parse(
//!     "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
//! )?;
//! assert_eq!(mscorlib.version, AssemblyVersion::new(4, 0, 0, 0));
//! assert!(mscorlib.is_strong_named());
//! # Ok::<(), dotmutate::Error>(())
//! ```

use std::{
    fmt::{self, Write as _},
    hash::{Hash, Hasher},
    str::FromStr,
};

use crate::{metadata::identity::cryptographic::compute_public_key_token, Result};

/// Complete identity information for a .NET assembly.
///
/// # Equality Semantics
///
/// Two `AssemblyIdentity` values are equal if and only if their `name`, `version`,
/// `culture` and `public_key_token` are equal. The `location` is excluded from both
/// [`PartialEq`] and [`Hash`], so the same assembly loaded from two places is still
/// the same assembly.
#[derive(Debug, Clone, Default)]
pub struct AssemblyIdentity {
    /// Simple assembly name (e.g. "mscorlib", "xunit.assert").
    pub name: String,
    /// Four-part version number.
    pub version: AssemblyVersion,
    /// Culture of a satellite assembly; empty for culture-neutral assemblies.
    pub culture: String,
    /// The 8-byte public key token, empty if the assembly is not strong-named.
    pub public_key_token: Vec<u8>,
    /// Where the assembly was loaded from. Opaque, interpretation is left to the loader.
    pub location: String,
}

impl PartialEq for AssemblyIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.culture == other.culture
            && self.public_key_token == other.public_key_token
    }
}

impl Eq for AssemblyIdentity {}

impl Hash for AssemblyIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.culture.hash(state);
        self.public_key_token.hash(state);
    }
}

/// Four-part version numbering for .NET assemblies.
///
/// Versions are compared component-wise in order: major, minor, build, revision.
///
/// ```rust
/// use dotmutate::metadata::identity::AssemblyVersion;
///
/// let version = AssemblyVersion::parse("1.5")?;
/// assert_eq!(version.to_string(), "1.5.0.0");
/// assert!(version > AssemblyVersion::new(1, 0, 0, 0));
/// # Ok::<(), dotmutate::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssemblyVersion {
    /// Major version component.
    pub major: u16,
    /// Minor version component.
    pub minor: u16,
    /// Build version component.
    pub build: u16,
    /// Revision version component.
    pub revision: u16,
}

impl AssemblyIdentity {
    /// Create a new assembly identity from its four key components.
    pub fn new(
        name: impl Into<String>,
        version: AssemblyVersion,
        culture: impl Into<String>,
        public_key_token: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            culture: culture.into(),
            public_key_token,
            location: String::new(),
        }
    }

    /// Create an identity whose token is derived from the full public key.
    ///
    /// The token is computed with [`compute_public_key_token`]; an empty key yields an
    /// empty token.
    pub fn from_public_key(
        name: impl Into<String>,
        version: AssemblyVersion,
        culture: impl Into<String>,
        public_key: &[u8],
    ) -> Self {
        Self::new(name, version, culture, compute_public_key_token(public_key))
    }

    /// The identity used when no real assembly is available.
    ///
    /// It has an empty name and an unknown version, see [`AssemblyIdentity::is_dummy`].
    #[must_use]
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Returns `true` for the placeholder identity produced by [`AssemblyIdentity::dummy`]
    /// (or any identity without a name).
    #[must_use]
    pub fn is_dummy(&self) -> bool {
        self.name.is_empty()
    }

    /// Attach the location the assembly was loaded from.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Parse an assembly identity from its display name.
    ///
    /// # Format
    ///
    /// ```text
    /// AssemblyName[, Version=Major.Minor.Build.Revision][, Culture=culture][, PublicKeyToken=token]
    /// ```
    ///
    /// `Culture=neutral` and `PublicKeyToken=null` map to empty values, unknown keys are
    /// ignored and missing components keep their defaults.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the version or token are syntactically invalid.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default().to_string();
        let mut version = AssemblyVersion::UNKNOWN;
        let mut culture = String::new();
        let mut public_key_token = Vec::new();

        for part in parts {
            if let Some(value) = part.strip_prefix("Version=") {
                version = AssemblyVersion::parse(value)?;
            } else if let Some(value) = part.strip_prefix("Culture=") {
                if !value.eq_ignore_ascii_case("neutral") {
                    culture = value.to_string();
                }
            } else if let Some(value) = part.strip_prefix("PublicKeyToken=") {
                if value != "null" && !value.is_empty() {
                    let token_bytes = hex::decode(value).map_err(|e| {
                        malformed_error!("Invalid hex in PublicKeyToken '{}': {}", value, e)
                    })?;

                    if token_bytes.len() != 8 {
                        return Err(malformed_error!(
                            "PublicKeyToken must be exactly 8 bytes (16 hex characters), got {} bytes from '{}'",
                            token_bytes.len(),
                            value
                        ));
                    }
                    public_key_token = token_bytes;
                }
            }
        }

        Ok(Self::new(name, version, culture, public_key_token))
    }

    /// Generate the display name of this identity.
    ///
    /// ```rust
    /// use dotmutate::metadata::identity::{AssemblyIdentity, AssemblyVersion};
    ///
    /// let identity = AssemblyIdentity::new("MyLib", AssemblyVersion::new(1, 2, 3, 4), "", vec![]);
    /// assert_eq!(
    ///     identity.display_name(),
    ///     "MyLib, Version=1.2.3.4, Culture=neutral, PublicKeyToken=null"
    /// );
    /// ```
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut display = format!("{}, Version={}", self.name, self.version);

        let culture = if self.culture.is_empty() {
            "neutral"
        } else {
            self.culture.as_str()
        };
        let _ = write!(display, ", Culture={culture}");

        if self.public_key_token.is_empty() {
            display.push_str(", PublicKeyToken=null");
        } else {
            let _ = write!(
                display,
                ", PublicKeyToken={}",
                hex::encode(&self.public_key_token)
            );
        }

        display
    }

    /// Check if this assembly carries a public key token.
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        !self.public_key_token.is_empty()
    }

    /// Check if this assembly is culture-neutral.
    #[must_use]
    pub fn is_culture_neutral(&self) -> bool {
        self.culture.is_empty()
    }
}

impl AssemblyVersion {
    /// The all-zero version, used when no version information is available.
    pub const UNKNOWN: Self = Self::new(0, 0, 0, 0);

    /// Create a new version from its four components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Returns `true` if this is [`AssemblyVersion::UNKNOWN`].
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.build == 0 && self.revision == 0
    }

    /// Parse a version string of one to four dot-separated components.
    ///
    /// Missing trailing components default to 0 and an empty string yields
    /// [`AssemblyVersion::UNKNOWN`].
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for more than four components or a component
    /// that is not a valid `u16`.
    pub fn parse(version_str: &str) -> Result<Self> {
        let version_str = version_str.trim();
        if version_str.is_empty() {
            return Ok(Self::UNKNOWN);
        }

        let parts: Vec<&str> = version_str.split('.').collect();
        if parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version_str));
        }

        let mut components = [0u16; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: {}", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for AssemblyVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for AssemblyIdentity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Identity of a module.
///
/// A module is keyed by its own name and by the key of the assembly that contains it,
/// so two equally named modules from different assembly versions are distinct.
#[derive(Debug, Clone, Default)]
pub struct ModuleIdentity {
    /// The module name, usually the file name of the module.
    pub name: String,
    /// Where the module was loaded from. Not part of equality.
    pub location: String,
    /// The assembly this module belongs to, if known.
    pub containing_assembly: Option<AssemblyIdentity>,
}

impl ModuleIdentity {
    /// Create a module identity.
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        containing_assembly: Option<AssemblyIdentity>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            containing_assembly,
        }
    }
}

impl PartialEq for ModuleIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.containing_assembly == other.containing_assembly
    }
}

impl Eq for ModuleIdentity {}

impl Hash for ModuleIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.containing_assembly.hash(state);
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.containing_assembly {
            Some(assembly) => write!(f, "{} ({})", self.name, assembly.display_name()),
            None => f.write_str(&self.name),
        }
    }
}

/// The identity of any compiled unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitIdentity {
    /// A module that is not itself an assembly manifest.
    Module(ModuleIdentity),
    /// An assembly (which is also its own manifest module).
    Assembly(AssemblyIdentity),
}

impl UnitIdentity {
    /// The simple name of the unit.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            UnitIdentity::Module(module) => &module.name,
            UnitIdentity::Assembly(assembly) => &assembly.name,
        }
    }

    /// The location the unit was loaded from.
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            UnitIdentity::Module(module) => &module.location,
            UnitIdentity::Assembly(assembly) => &assembly.location,
        }
    }

    /// The version of the unit; modules report the version of their containing assembly.
    #[must_use]
    pub fn version(&self) -> AssemblyVersion {
        match self {
            UnitIdentity::Module(module) => module
                .containing_assembly
                .as_ref()
                .map_or(AssemblyVersion::UNKNOWN, |assembly| assembly.version),
            UnitIdentity::Assembly(assembly) => assembly.version,
        }
    }

    /// The assembly identity, if this identifies an assembly.
    #[must_use]
    pub fn as_assembly(&self) -> Option<&AssemblyIdentity> {
        match self {
            UnitIdentity::Assembly(assembly) => Some(assembly),
            UnitIdentity::Module(_) => None,
        }
    }
}

impl From<AssemblyIdentity> for UnitIdentity {
    fn from(identity: AssemblyIdentity) -> Self {
        UnitIdentity::Assembly(identity)
    }
}

impl From<ModuleIdentity> for UnitIdentity {
    fn from(identity: ModuleIdentity) -> Self {
        UnitIdentity::Module(identity)
    }
}

impl fmt::Display for UnitIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitIdentity::Module(module) => module.fmt(f),
            UnitIdentity::Assembly(assembly) => assembly.fmt(f),
        }
    }
}
