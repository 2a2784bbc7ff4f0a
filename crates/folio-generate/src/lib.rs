//! Static output generation for Folio.
//!
//! Two stages turn a running site into files on disk:
//!
//! - [`PageAggregator`] assembles the list of pages to render (content pages,
//!   tag pages, declared routes, registered endpoints and configured pages)
//!   and the list of static content to copy.
//! - [`OutputGenerator`] rebuilds the output directory from scratch: it
//!   creates every needed directory up front, copies static content, then
//!   fetches every page through a [`Renderer`] concurrently and writes the
//!   HTML.
//!
//! Failures scoped to a single page or file are logged and recorded in the
//! [`GenerationReport`]; only failing to recreate the output root aborts a
//! run.

mod aggregate;
mod generator;
mod render;
mod routes;
mod types;

pub use aggregate::{ContentPages, ContentProvider, PageAggregator};
pub use generator::{GenerateError, GenerateOptions, GenerationReport, OutputGenerator, SkippedPage};
pub use render::{HttpRenderer, RenderFetchError, Renderer};
pub use routes::{
    Endpoint, EndpointKind, RouteProvider, StaticRouteProvider, is_generatable_endpoint,
    is_parameterless, output_file_for_route,
};
pub use types::{ContentToCopy, PageToGenerate};
