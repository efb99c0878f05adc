// src/filesystem/mod.rs

//! On-disk storage for installed chaincode payloads

pub mod cas;

pub use cas::CasStore;
