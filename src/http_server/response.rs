//! Response envelopes shared by the movie handlers

use serde::Serialize;

use crate::catalog::MovieRecord;

/// Success body for create/update/delete
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub estado: &'static str,
    pub mensaje: &'static str,
    pub pelicula: MovieRecord,
}

impl MutationResponse {
    pub fn success(mensaje: &'static str, pelicula: MovieRecord) -> Self {
        Self {
            estado: "success",
            mensaje,
            pelicula,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenresResponse {
    pub generos: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
