//! # Hermes Lambda
//!
//! Platform adapters for Hermes middleware.
//!
//! | Adapter | Input | Output | Errors |
//! |---------|-------|--------|--------|
//! | [`apigateway`] | proxy request | [`ApiGatewayProxyResponse`] | mapped to an error response |
//! | [`sqs`] | [`SqsEvent`] | [`SqsBatchResponse`] | reported as batch item failures |
//!
//! Both adapters decode the `body` field by default when it is declared;
//! a `body` transformer registered by the caller takes precedence.

#![doc(html_root_url = "https://docs.rs/hermes-lambda/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod apigateway;
pub mod fixtures;
pub mod sqs;

pub use apigateway::{ApiGatewayProxyRequest, ApiGatewayProxyResponse, ErrorMapper, ResponseOptions};
pub use sqs::{BatchItemFailure, BatchMode, SqsBatchHandler, SqsBatchResponse, SqsEvent, SqsMessage};
