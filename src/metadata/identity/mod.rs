//! Identities of compiled units and the rules that relate them.
//!
//! This module provides value identities for modules and assemblies, the
//! derivation of public key tokens, and the version arbitration that decides which
//! referenced assembly plays a platform role (core or contract assembly).
//!
//! # Module Structure
//!
//! - [`assembly`] - Assembly, module and unit identities, version numbering
//! - [`cryptographic`] - Public key token derivation (ECMA-335 II.6.2.1.3)
//! - [`marker`] - Marker-assembly resolution across unit references
//!
//! # Usage Examples
//!
//! ```rust
//! use dotmutate::metadata::identity::{AssemblyIdentity, AssemblyVersion};
//!
//! let ecma_key = [0u8, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
//! let identity = AssemblyIdentity::from_public_key(
//!     "System.Runtime",
//!     AssemblyVersion::new(4, 0, 0, 0),
//!     "",
//!     &ecma_key,
//! );
//!
//! assert_eq!(
//!     identity.display_name(),
//!     "System.Runtime, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089"
//! );
//! ```
//!
//! # Thread Safety
//!
//! Identities are plain values and are [`Send`] and [`Sync`]. Marker resolution
//! memoizes its answers in per-unit cells and may run concurrently for different
//! units.

pub mod assembly;
pub mod cryptographic;
pub mod marker;

pub use assembly::{AssemblyIdentity, AssemblyVersion, ModuleIdentity, UnitIdentity};
pub use cryptographic::{compute_public_key_token, compute_public_key_token_with, HashAlgorithm};
pub use marker::{resolve_marker_assembly_identity, MarkerKind, MarkerPredicate, MarkerType};
