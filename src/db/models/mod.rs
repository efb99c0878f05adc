// src/db/models/mod.rs

//! Data models for registry database entities

mod chaincode;

pub use chaincode::Chaincode;
