// src/integrations/youtube/mod.rs
//
// YouTube Data API v3

pub mod client;
mod models;
