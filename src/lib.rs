//! towerdocs: catalog of telecommunications tower designs and their PDF
//! specification sheets, with an admin area for managing both.

pub mod cli;
pub mod config;
pub mod models;
pub mod pdf;
pub mod repository;
pub mod server;
pub mod services;
pub mod storage;
