#![deny(warnings)]

//! Predictive model adapter: serialized regression pipelines, load-once
//! model handles and artifact provisioning.

pub mod artifact;
pub mod provision;
pub mod registry;

pub use artifact::{ColumnSpec, Encoding, Estimator, ModelArtifact, RegressionTree, TreeNode};
pub use provision::{ensure_artifact, ArtifactSource, CurlFetcher, Fetcher, DEFAULT_MIN_ARTIFACT_BYTES};
pub use registry::{load_model, LoadedModel, ModelRegistry};
