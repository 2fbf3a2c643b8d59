//! Query construction and result normalization for suse-obs-mcp.
//!
//! This crate turns tool parameters into STQL and `PromQL` requests, joins and
//! normalizes the backend responses, and renders them as bounded Markdown. The
//! backend itself sits behind the ports in [`backend`], with a `reqwest`
//! implementation in [`backend::http`].

pub mod backend;
pub mod control;
pub mod normalize;
pub mod params;
pub mod query;
pub mod render;
