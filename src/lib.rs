// SPDX-License-Identifier: MIT OR Apache-2.0

//! docqa - Retrieval-augmented question answering over local documents
//!
//! Shared modules for the docqa CLI tool: chunking, embedding, the exact
//! vector index, the retrieval service and answer synthesis.

pub mod answer;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod index;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod retriever;
pub mod utils;
