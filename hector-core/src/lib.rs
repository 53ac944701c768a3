//! Hector Core
//!
//! Core types and abstractions for the Hector workflow orchestration system.
//!
//! This crate contains:
//! - Domain types: the persisted artifacts (Component, Specification,
//!   Planning, Definition) and the execution records (Job, ResultJob,
//!   ResultDefinition)
//! - DTOs: thin wire-only types for the HTTP API
//!
//! Note: Persistence lives in the orchestrator's store layer, execution in
//! its executor layer; this crate is structure only.

pub mod domain;
pub mod dto;
