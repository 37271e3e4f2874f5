//! Arithmetic over path operands.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::Path, routing::get, Json, Router};
use erudio_http::error::AppError;
use erudio_kernel::Module;
use serde_json::json;

use crate::error::ServiceError;

const NOT_NUMERIC: &str = "Please set a numeric value!";

/// Parse a decimal operand, accepting a comma as decimal separator.
fn operand(raw: &str) -> Result<f64, ServiceError> {
    let normalized = raw.trim().replace(',', ".");
    let well_formed = !normalized.is_empty()
        && normalized
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        && normalized.chars().any(|c| c.is_ascii_digit());

    well_formed
        .then(|| normalized.parse::<f64>().ok())
        .flatten()
        .ok_or_else(|| ServiceError::InvalidInput(NOT_NUMERIC.to_string()))
}

pub fn sum(a: &str, b: &str) -> Result<f64, ServiceError> {
    Ok(operand(a)? + operand(b)?)
}

pub fn subtraction(a: &str, b: &str) -> Result<f64, ServiceError> {
    Ok(operand(a)? - operand(b)?)
}

pub fn multiplication(a: &str, b: &str) -> Result<f64, ServiceError> {
    Ok(operand(a)? * operand(b)?)
}

pub fn division(a: &str, b: &str) -> Result<f64, ServiceError> {
    let (a, b) = (operand(a)?, operand(b)?);
    if b == 0.0 {
        return Err(ServiceError::InvalidInput(
            "Division by zero is not allowed!".to_string(),
        ));
    }
    Ok(a / b)
}

pub fn mean(a: &str, b: &str) -> Result<f64, ServiceError> {
    Ok((operand(a)? + operand(b)?) / 2.0)
}

pub fn square_root(n: &str) -> Result<f64, ServiceError> {
    let n = operand(n)?;
    if n < 0.0 {
        return Err(ServiceError::InvalidInput(
            "Square root of a negative number is not allowed!".to_string(),
        ));
    }
    Ok(n.sqrt())
}

type Binary = fn(&str, &str) -> Result<f64, ServiceError>;

fn binary(operation: Binary) -> axum::routing::MethodRouter {
    get(move |Path((a, b)): Path<(String, String)>| async move {
        operation(&a, &b).map(Json).map_err(AppError::from)
    })
}

pub struct MathModule;

#[async_trait]
impl Module for MathModule {
    fn name(&self) -> &'static str {
        "math"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/sum/{a}/{b}", binary(sum))
            .route("/subtraction/{a}/{b}", binary(subtraction))
            .route("/multiplication/{a}/{b}", binary(multiplication))
            .route("/division/{a}/{b}", binary(division))
            .route("/mean/{a}/{b}", binary(mean))
            .route(
                "/squareRoot/{n}",
                get(|Path(n): Path<String>| async move {
                    square_root(&n).map(Json).map_err(AppError::from)
                }),
            )
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let param = |name: &str| {
            json!({ "name": name, "in": "path", "required": true, "schema": { "type": "string" } })
        };
        let result = json!({
            "200": {
                "description": "Result",
                "content": { "application/json": { "schema": { "type": "number" } } }
            },
            "400": {
                "description": "Operand is not numeric",
                "content": {
                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                }
            }
        });

        let mut paths = serde_json::Map::new();
        for operation in ["sum", "subtraction", "multiplication", "division", "mean"] {
            paths.insert(
                format!("/{}/{{a}}/{{b}}", operation),
                json!({
                    "get": {
                        "summary": format!("Computes the {} of two numbers", operation),
                        "tags": ["Math"],
                        "parameters": [param("a"), param("b")],
                        "responses": result
                    }
                }),
            );
        }
        paths.insert(
            "/squareRoot/{n}".to_string(),
            json!({
                "get": {
                    "summary": "Computes the square root of a number",
                    "tags": ["Math"],
                    "parameters": [param("n")],
                    "responses": result
                }
            }),
        );

        Some(json!({ "paths": paths }))
    }
}

pub fn create_module() -> Arc<dyn Module> {
    Arc::new(MathModule)
}
