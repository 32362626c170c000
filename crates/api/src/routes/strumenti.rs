use crate::error_response;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use patrimonio_core::strumenti::{interesse_composto, irpef, mutuo, StrumentoError};
use serde::Serialize;

fn respond<T: Serialize>(result: Result<T, StrumentoError>) -> Response {
    match result {
        Ok(out) => Json(out).into_response(),
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

fn rejected(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

pub async fn post_interesse_composto(
    input: Result<Json<interesse_composto::AccumuloInput>, JsonRejection>,
) -> Response {
    match input {
        Ok(Json(input)) => respond(interesse_composto::calcola(&input)),
        Err(rejection) => rejected(rejection),
    }
}

pub async fn post_mutuo(input: Result<Json<mutuo::MutuoInput>, JsonRejection>) -> Response {
    match input {
        Ok(Json(input)) => respond(mutuo::calcola(&input)),
        Err(rejection) => rejected(rejection),
    }
}

pub async fn post_irpef(input: Result<Json<irpef::IrpefInput>, JsonRejection>) -> Response {
    match input {
        Ok(Json(input)) => respond(irpef::calcola(&input)),
        Err(rejection) => rejected(rejection),
    }
}
