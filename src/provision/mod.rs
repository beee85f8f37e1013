//! # Artifact Provisioning
//!
//! Makes sure the model weights file exists on local disk before anything tries
//! to load it: fetch it when missing, verify its SHA-256, keep it when valid and
//! delete it when not.
//!
//! ## Key Components
//!
//! - `ArtifactSpec`: where the artifact comes from, where it goes, what it must hash to
//! - `Provisioner`: the fetch-verify-cache routine
//! - `ArtifactSource`: the seam between the provisioner and the network
//! - `HttpSource`: the blocking reqwest implementation of `ArtifactSource`
//!
//! ## Guarantees
//!
//! A download is written to a `.part` sibling and only renamed onto the target
//! path after its digest matches, so the target path never holds a partial or
//! mismatched file produced by this routine. Provisioning of a given path is
//! serialized inside the process.

mod digest;
mod lock;
mod provisioner;
mod source;
mod types;

pub use digest::{digests_match, sha256_file, sha256_hex};
pub use provisioner::Provisioner;
pub use source::{ArtifactSource, FetchError, HttpSource, CHUNK_SIZE};
pub use types::{ArtifactSpec, ArtifactState, ProvisionError, VerifyPolicy};
