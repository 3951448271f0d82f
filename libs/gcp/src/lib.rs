//! # vmtailor-gcp
//!
//! GCP REST adapters for vmtailor: thin clients for the Compute Engine
//! and Recommender v1 APIs, the gateway implementation the resize
//! orchestrator drives, and the translation from a machine-type
//! recommendation to a [`vmtailor_resize::ResizeRequest`].
//!
//! Authentication is a bearer token supplied by the caller. Obtaining
//! and storing tokens is the CLI's concern, not this crate's.

mod compute;
mod error;
mod gateway;
mod http;
mod recommender;

pub use compute::{ComputeClient, Instance, Operation, DEFAULT_COMPUTE_URL};
pub use error::ApiError;
pub use gateway::GcpComputeGateway;
pub use recommender::{
    resize_request_from_recommendation, CostProjection, ExtractError, Impact, Money,
    OperationGroup, Recommendation, RecommendationContent, RecommendationOperation,
    RecommenderClient, StateInfo, DEFAULT_RECOMMENDER_URL, MACHINE_TYPE_RECOMMENDER,
};
