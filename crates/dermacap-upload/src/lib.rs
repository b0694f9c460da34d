//! Dermacap Upload - remote risk-screening client
//!
//! Sends a saved capture to the inference endpoint and decodes the returned
//! risk visualization. A single unary request per screening; failures are
//! reported, never retried.

pub mod client;

pub use client::{
    InferenceClient, PredictionRequest, PredictionResponse, ScreeningResult, UploadError,
    UploadResult, MODELS,
};
