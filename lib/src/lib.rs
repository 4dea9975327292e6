#![forbid(unsafe_code)]
#![warn(clippy::dbg_macro, clippy::use_debug, clippy::todo)]

use sea_orm::DatabaseConnection;

use crate::jwt::JwtSecret;
use crate::redis::RedisConnection;
use crate::services::Services;
use crate::storage::BlobStorage;

pub mod auth;
pub mod config;
pub mod jwt;
pub mod redis;
pub mod services;
pub mod storage;

#[derive(Debug, Clone)]
pub struct SharedState {
    pub jwt_secret: JwtSecret,
    pub auth_redis: RedisConnection,
    pub services: Services,
    pub storage: BlobStorage,
    pub db: DatabaseConnection,
}
