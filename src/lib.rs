#[macro_use]
extern crate rocket;

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod service;
pub mod telemetry;
pub mod validation;
pub mod workflow;
#[cfg(test)]
mod test;

use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::config::ConfigError;
use crate::database::StoreFeatures;
use crate::error::AppError;
use crate::telemetry::TelemetryFairing;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("{0}")]
    Rocket(Box<rocket::Error>),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

impl From<rocket::Error> for Error {
    fn from(value: rocket::Error) -> Self {
        Error::Rocket(Box::new(value))
    }
}

pub fn init_rocket(pool: SqlitePool, features: StoreFeatures) -> Rocket<Build> {
    info!("Starting mat-connect");

    rocket::build()
        .manage(pool)
        .manage(features)
        .mount("/api", api::routes())
        .register("/api", api::catchers())
        .attach(TelemetryFairing)
}
