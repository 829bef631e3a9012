pub mod access;
pub mod auth;
pub mod configuration;
pub mod database;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod repo;
pub mod retry;
pub mod search;
pub mod telemetry;
pub mod web;
