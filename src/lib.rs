//! Test execution lifecycle engine.
//!
//! Turns reusable test-case templates into trackable executions, records
//! per-step outcomes, derives aggregate execution status and drives the
//! defect remediation and retest workflow on top of a relational store.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod migration;
pub mod models;
pub mod services;
